//! Closed enumerations that config lists match against
//!
//! Each enumeration exposes its full member list so that globs like
//! `STRIPPED_*` can be expanded at parse time.

use std::fmt;
use std::hash::Hash;

/// A closed set of named constants.
pub trait NamedVariant: Copy + Eq + Hash + Ord + fmt::Debug + 'static {
    /// Human name of the enumeration, used in error messages.
    const KIND: &'static str;

    fn all() -> &'static [Self];

    fn name(&self) -> &'static str;

    /// Case-insensitive lookup by constant name.
    fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::all()
            .iter()
            .copied()
            .find(|v| v.name().eq_ignore_ascii_case(name))
    }
}

macro_rules! named_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident ($kind:literal) {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis enum $name {
            $($variant),+
        }

        impl NamedVariant for $name {
            const KIND: &'static str = $kind;

            fn all() -> &'static [Self] {
                &[$($name::$variant),+]
            }

            fn name(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

// ============================================================================
// Materials
// ============================================================================

named_enum! {
    /// Block and item materials.
    pub enum Material("Material") {
        Air => "AIR",
        Stone => "STONE",
        Cobblestone => "COBBLESTONE",
        Deepslate => "DEEPSLATE",
        Dirt => "DIRT",
        GrassBlock => "GRASS_BLOCK",
        Sand => "SAND",
        Gravel => "GRAVEL",
        OakLog => "OAK_LOG",
        BirchLog => "BIRCH_LOG",
        SpruceLog => "SPRUCE_LOG",
        StrippedOakLog => "STRIPPED_OAK_LOG",
        StrippedBirchLog => "STRIPPED_BIRCH_LOG",
        StrippedSpruceLog => "STRIPPED_SPRUCE_LOG",
        OakPlanks => "OAK_PLANKS",
        CoalOre => "COAL_ORE",
        IronOre => "IRON_ORE",
        GoldOre => "GOLD_ORE",
        DiamondOre => "DIAMOND_ORE",
        DeepslateIronOre => "DEEPSLATE_IRON_ORE",
        DeepslateDiamondOre => "DEEPSLATE_DIAMOND_ORE",
        Wheat => "WHEAT",
        Carrots => "CARROTS",
        Potatoes => "POTATOES",
        Coal => "COAL",
        IronIngot => "IRON_INGOT",
        GoldIngot => "GOLD_INGOT",
        Diamond => "DIAMOND",
        Emerald => "EMERALD",
        Bread => "BREAD",
        Cod => "COD",
        Salmon => "SALMON",
        CookedCod => "COOKED_COD",
        Paper => "PAPER",
        Book => "BOOK",
        EnchantedBook => "ENCHANTED_BOOK",
        Potion => "POTION",
        SplashPotion => "SPLASH_POTION",
        GlassBottle => "GLASS_BOTTLE",
        Bucket => "BUCKET",
        MilkBucket => "MILK_BUCKET",
        WoodenSword => "WOODEN_SWORD",
        IronSword => "IRON_SWORD",
        DiamondSword => "DIAMOND_SWORD",
        IronPickaxe => "IRON_PICKAXE",
        DiamondPickaxe => "DIAMOND_PICKAXE",
        Bow => "BOW",
        FishingRod => "FISHING_ROD",
        Shield => "SHIELD",
        IronHelmet => "IRON_HELMET",
        IronChestplate => "IRON_CHESTPLATE",
        IronLeggings => "IRON_LEGGINGS",
        IronBoots => "IRON_BOOTS",
        RottenFlesh => "ROTTEN_FLESH",
        Bone => "BONE",
        String => "STRING",
        Leather => "LEATHER",
    }
}

impl Material {
    /// Accepts `stone`, `STONE` and `minecraft:stone`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let bare = text.strip_prefix("minecraft:").unwrap_or(text);
        Self::from_name(bare)
    }
}

// ============================================================================
// Entities
// ============================================================================

named_enum! {
    pub enum EntityKind("EntityType") {
        Zombie => "ZOMBIE",
        Skeleton => "SKELETON",
        Creeper => "CREEPER",
        Spider => "SPIDER",
        CaveSpider => "CAVE_SPIDER",
        Enderman => "ENDERMAN",
        Witch => "WITCH",
        Slime => "SLIME",
        ZombieVillager => "ZOMBIE_VILLAGER",
        Cow => "COW",
        Mooshroom => "MOOSHROOM",
        Pig => "PIG",
        Sheep => "SHEEP",
        Chicken => "CHICKEN",
        Goat => "GOAT",
        Wolf => "WOLF",
        Horse => "HORSE",
        Villager => "VILLAGER",
        Player => "PLAYER",
        ArmorStand => "ARMOR_STAND",
        ItemFrame => "ITEM_FRAME",
    }
}

impl EntityKind {
    pub fn is_monster(&self) -> bool {
        matches!(
            self,
            EntityKind::Zombie
                | EntityKind::Skeleton
                | EntityKind::Creeper
                | EntityKind::Spider
                | EntityKind::CaveSpider
                | EntityKind::Enderman
                | EntityKind::Witch
                | EntityKind::ZombieVillager
        )
    }
}

// ============================================================================
// Potions and item rarity
// ============================================================================

named_enum! {
    pub enum PotionType("PotionType") {
        Water => "WATER",
        Awkward => "AWKWARD",
        Mundane => "MUNDANE",
        Thick => "THICK",
        Swiftness => "SWIFTNESS",
        LongSwiftness => "LONG_SWIFTNESS",
        StrongSwiftness => "STRONG_SWIFTNESS",
        Healing => "HEALING",
        StrongHealing => "STRONG_HEALING",
        Poison => "POISON",
        NightVision => "NIGHT_VISION",
        Strength => "STRENGTH",
        Regeneration => "REGENERATION",
        FireResistance => "FIRE_RESISTANCE",
        Invisibility => "INVISIBILITY",
        Weakness => "WEAKNESS",
        Slowness => "SLOWNESS",
    }
}

named_enum! {
    pub enum Rarity("ItemRarity") {
        Common => "COMMON",
        Uncommon => "UNCOMMON",
        Rare => "RARE",
        Epic => "EPIC",
    }
}
