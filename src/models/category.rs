use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Emotion {
    #[serde(rename = "开心😊")]
    Happy,
    #[serde(rename = "幸福🥰")]
    Blissful,
    #[serde(rename = "兴奋🤩")]
    Excited,
    #[serde(rename = "自豪😎")]
    Proud,
    #[serde(rename = "平静😐")]
    Calm,
    #[serde(rename = "痛苦😫")]
    Anguished,
    #[serde(rename = "悲伤☹️")]
    Sad,
    #[serde(rename = "疲惫😭")]
    Exhausted,
    #[serde(rename = "生病😷")]
    Sick,
    #[serde(rename = "气愤😡")]
    Angry,
    #[serde(rename = "成就🥂")]
    Accomplished,
    #[serde(rename = "心流🧘")]
    Flow,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Appetite {
    #[serde(rename = "食欲稳定🥗")]
    Steady,
    #[serde(rename = "想吃辣的🌶")]
    Spicy,
    #[serde(rename = "想吃碳水🍜")]
    Carbs,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Confidence {
    #[serde(rename = "自信满满")]
    Confident,
    #[serde(rename = "自我怀疑")]
    SelfDoubt,
}

/// A fixed enumerated attribute tracked once per day.
///
/// `ALL` is the domain order: it decides both the color a value gets and
/// its position in a heatmap legend.
pub trait Category: Copy + Eq + 'static {
    const ALL: &'static [Self];

    /// Text stored in the record header and used in JSON.
    fn label(self) -> &'static str;

    /// ASCII name drawn in heatmap legends.
    fn slug(self) -> &'static str;

    fn color(self) -> [u8; 3];

    fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|v| *v == self)
            .unwrap_or_default()
    }

    fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL.iter().copied().find(|v| v.label() == label)
    }
}

impl Category for Emotion {
    const ALL: &'static [Self] = &[
        Self::Happy,
        Self::Blissful,
        Self::Excited,
        Self::Proud,
        Self::Calm,
        Self::Anguished,
        Self::Sad,
        Self::Exhausted,
        Self::Sick,
        Self::Angry,
        Self::Accomplished,
        Self::Flow,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::Happy => "开心😊",
            Self::Blissful => "幸福🥰",
            Self::Excited => "兴奋🤩",
            Self::Proud => "自豪😎",
            Self::Calm => "平静😐",
            Self::Anguished => "痛苦😫",
            Self::Sad => "悲伤☹️",
            Self::Exhausted => "疲惫😭",
            Self::Sick => "生病😷",
            Self::Angry => "气愤😡",
            Self::Accomplished => "成就🥂",
            Self::Flow => "心流🧘",
        }
    }

    fn slug(self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Blissful => "blissful",
            Self::Excited => "excited",
            Self::Proud => "proud",
            Self::Calm => "calm",
            Self::Anguished => "anguished",
            Self::Sad => "sad",
            Self::Exhausted => "exhausted",
            Self::Sick => "sick",
            Self::Angry => "angry",
            Self::Accomplished => "accomplished",
            Self::Flow => "flow",
        }
    }

    fn color(self) -> [u8; 3] {
        match self {
            Self::Happy => [0xFF, 0xD7, 0x00],
            Self::Blissful => [0xFF, 0x69, 0xB4],
            Self::Excited => [0xFF, 0x45, 0x00],
            Self::Proud => [0x41, 0x69, 0xE1],
            Self::Calm => [0x87, 0xCE, 0xEB],
            Self::Anguished => [0x8B, 0x45, 0x13],
            Self::Sad => [0x46, 0x82, 0xB4],
            Self::Exhausted => [0x70, 0x80, 0x90],
            Self::Sick => [0x98, 0xFB, 0x98],
            Self::Angry => [0xDC, 0x14, 0x3C],
            // Goldenrod, so it stays apart from Happy's gold
            Self::Accomplished => [0xDA, 0xA5, 0x20],
            Self::Flow => [0x93, 0x70, 0xDB],
        }
    }
}

impl Category for Appetite {
    const ALL: &'static [Self] = &[Self::Steady, Self::Spicy, Self::Carbs];

    fn label(self) -> &'static str {
        match self {
            Self::Steady => "食欲稳定🥗",
            Self::Spicy => "想吃辣的🌶",
            Self::Carbs => "想吃碳水🍜",
        }
    }

    fn slug(self) -> &'static str {
        match self {
            Self::Steady => "steady",
            Self::Spicy => "spicy",
            Self::Carbs => "carbs",
        }
    }

    fn color(self) -> [u8; 3] {
        match self {
            Self::Steady => [0x90, 0xEE, 0x90],
            Self::Spicy => [0xFF, 0x63, 0x47],
            Self::Carbs => [0xFF, 0xA5, 0x00],
        }
    }
}

impl Category for Confidence {
    const ALL: &'static [Self] = &[Self::Confident, Self::SelfDoubt];

    fn label(self) -> &'static str {
        match self {
            Self::Confident => "自信满满",
            Self::SelfDoubt => "自我怀疑",
        }
    }

    fn slug(self) -> &'static str {
        match self {
            Self::Confident => "confident",
            Self::SelfDoubt => "self-doubt",
        }
    }

    fn color(self) -> [u8; 3] {
        match self {
            Self::Confident => [0x32, 0xCD, 0x32],
            Self::SelfDoubt => [0xFF, 0xB6, 0xC1],
        }
    }
}

/// The three attributes a heatmap can be drawn for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CategoryField {
    Emotion,
    Appetite,
    Confidence,
}

impl CategoryField {
    pub const ALL: [CategoryField; 3] = [Self::Emotion, Self::Appetite, Self::Confidence];

    /// Header key, also the field part of heatmap file names.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Emotion => "Emotion",
            Self::Appetite => "Appetite",
            Self::Confidence => "Confidence",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == s)
    }

    /// (slug, color) for every value of the field, in domain order.
    pub fn domain(self) -> Vec<(&'static str, [u8; 3])> {
        fn collect<C: Category>() -> Vec<(&'static str, [u8; 3])> {
            C::ALL.iter().map(|v| (v.slug(), v.color())).collect()
        }
        match self {
            Self::Emotion => collect::<Emotion>(),
            Self::Appetite => collect::<Appetite>(),
            Self::Confidence => collect::<Confidence>(),
        }
    }
}

impl std::fmt::Display for CategoryField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-day category values pulled out of a record header. Heatmap input only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRecord {
    pub date: NaiveDate,
    pub emotion: Option<Emotion>,
    pub appetite: Option<Appetite>,
    pub confidence: Option<Confidence>,
}

impl CategoryRecord {
    /// Domain index of the value held for `field`, if any.
    pub fn value_index(&self, field: CategoryField) -> Option<usize> {
        match field {
            CategoryField::Emotion => self.emotion.map(Category::index),
            CategoryField::Appetite => self.appetite.map(Category::index),
            CategoryField::Confidence => self.confidence.map(Category::index),
        }
    }
}
