/// Integration tests for equip/unequip slot handling and safe removal
use ranvale::entity::equipment::{HELD, OFFHAND, OFFHAND_HELD, WIELD};
use ranvale::entity::notice::{CollectingSink, Tone};
use ranvale::entity::{Item, PlayerEntity, UnequipOutcome};
use uuid::Uuid;

fn carry(player: &mut PlayerEntity, item: Item) -> Uuid {
    let id = item.uuid;
    player.add_item(item);
    id
}

#[test]
fn test_unequip_prefers_container_over_free_hand() {
    let mut player = PlayerEntity::new("Ash", "ash");
    let satchel = carry(&mut player, Item::container("a leather satchel", 1, 5, 6));
    let gloves = carry(&mut player, Item::new("padded gloves", 1, 2).with_soak(1));
    player.equip("hands", gloves).expect("equip");

    let outcome = player.unequip(gloves, false).expect("unequip");
    assert_eq!(
        outcome,
        UnequipOutcome::Stowed {
            slot: "hands".to_string(),
            container: satchel
        }
    );

    let bag = player.inventory().find(satchel).expect("satchel");
    assert_eq!(bag.contents().len(), 1);
    assert_eq!(bag.remaining_size_capacity(), 4);
    assert_eq!(player.inventory().len(), 1);

    let mut sink = CollectingSink::default();
    player.flush(&mut sink);
    assert_eq!(sink.player.len(), 1);
    assert_eq!(sink.room.len(), 1);
    let (actor, _, text) = &sink.room[0];
    assert_eq!(actor, "Ash");
    assert_eq!(
        text,
        "Ash removes their padded gloves and places it in their a leather satchel."
    );
}

#[test]
fn test_full_container_falls_back_to_holding() {
    let mut player = PlayerEntity::new("Ash", "ash");
    carry(&mut player, Item::container("a coin purse", 0, 1, 1));
    let helm = carry(&mut player, Item::new("a bronze helm", 4, 3));
    player.equip("head", helm).expect("equip");

    let outcome = player.unequip(helm, false).expect("unequip");
    assert_eq!(
        outcome,
        UnequipOutcome::Held {
            slot: "head".to_string(),
            grip: HELD
        }
    );
    assert_eq!(player.equipped_id(HELD), Some(helm));
    assert_eq!(player.equipped_id("head"), None);
    assert!(player.inventory().find(helm).map(|i| i.equipped).unwrap_or(false));
}

#[test]
fn test_second_held_item_goes_to_offhand_held() {
    let mut player = PlayerEntity::new("Ash", "ash");
    let torch = carry(&mut player, Item::new("a torch", 1, 2));
    let boots = carry(&mut player, Item::new("hobnail boots", 3, 3));
    player.equip(HELD, torch).expect("equip");
    player.equip("feet", boots).expect("equip");

    // wield, offhand and offhand held are free
    assert!(player.can_hold());
    assert_eq!(player.find_holding_location(), OFFHAND_HELD);
    let outcome = player.unequip(boots, false).expect("unequip");
    assert_eq!(outcome.slot(), Some("feet"));
    assert_eq!(player.equipped_id(OFFHAND_HELD), Some(boots));
}

#[test]
fn test_unequip_refused_keeps_everything_in_place() {
    let mut player = PlayerEntity::new("Ash", "ash");
    let sword = carry(&mut player, Item::new("a longsword", 6, 4));
    let shield = carry(&mut player, Item::new("a kite shield", 8, 5).with_soak(2));
    player.equip(WIELD, sword).expect("equip");
    player.equip(OFFHAND, shield).expect("equip");
    assert!(!player.can_hold());

    let before = player.equipment().clone();
    assert_eq!(player.unequip(shield, false).expect("unequip"), UnequipOutcome::HandsFull);
    assert_eq!(player.equipment(), &before);

    let mut sink = CollectingSink::default();
    player.flush(&mut sink);
    assert_eq!(sink.player.len(), 1);
    assert_eq!(sink.player[0].tone, Tone::Warning);
    assert!(sink.room.is_empty());

    // Dropping bypasses relocation entirely.
    assert_eq!(
        player.unequip(shield, true).expect("unequip"),
        UnequipOutcome::Removed {
            slot: OFFHAND.to_string()
        }
    );
    assert_eq!(player.equipped_id(OFFHAND), None);
}

#[test]
fn test_replacing_inventory_drops_stale_slots() {
    let mut player = PlayerEntity::new("Ash", "ash");
    let cloak = carry(&mut player, Item::new("a wool cloak", 2, 3));
    player.equip("torso", cloak).expect("equip");

    player.set_inventory(vec![Item::new("a pebble", 0, 1)]);
    assert!(player.equipment().is_empty());
    assert_eq!(player.inventory().len(), 1);
}

#[test]
fn test_armor_soak_follows_equipment() {
    let mut player = PlayerEntity::new("Ash", "ash");
    let cap = carry(&mut player, Item::new("a leather cap", 1, 1).with_soak(3));
    player.equip("head", cap).expect("equip");

    assert_eq!(player.damage(5, Some("head")), Some(2));
    assert_eq!(player.damage(5, Some("legs")), Some(5));

    player.unequip(cap, true).expect("unequip");
    assert_eq!(player.damage(5, Some("head")), Some(5));
    assert_eq!(player.attribute("health"), Some(78));
}
