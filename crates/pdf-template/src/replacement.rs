use serde::{Deserialize, Serialize};

/// Text callers send when a lookup produced no value.
///
/// Matched ASCII case-insensitively after trimming surrounding whitespace,
/// so `" Not Found "` is the sentinel too.
pub const NOT_FOUND_SENTINEL: &str = "not found";

/// Value prefixes that mark a replacement as image data
pub const IMAGE_PREFIXES: [&str; 2] = ["data:image", "http"];

/// What a token is replaced with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplacementValue {
    /// Literal text, inserted as-is (empty text becomes a single space)
    Text(String),
    /// The "not found" marker, rendered as a single space
    NotFound,
    /// A data URI or remote URL, rendered as an `<img>` element
    Image(String),
}

impl ReplacementValue {
    /// Classify raw caller text the way the request layer sends it
    pub fn classify(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        if IMAGE_PREFIXES.iter().any(|prefix| raw.starts_with(prefix)) {
            ReplacementValue::Image(raw)
        } else if raw.trim().eq_ignore_ascii_case(NOT_FOUND_SENTINEL) {
            ReplacementValue::NotFound
        } else {
            ReplacementValue::Text(raw)
        }
    }
}

impl From<&str> for ReplacementValue {
    fn from(raw: &str) -> Self {
        ReplacementValue::classify(raw)
    }
}

impl From<String> for ReplacementValue {
    fn from(raw: String) -> Self {
        ReplacementValue::classify(raw)
    }
}

/// A single (token, value) pair supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub token: String,
    pub value: ReplacementValue,
}

impl Replacement {
    pub fn new(token: impl Into<String>, value: impl Into<ReplacementValue>) -> Self {
        Self {
            token: token.into(),
            value: value.into(),
        }
    }
}

/// Ordered replacement mapping.
///
/// Registration order decides which token wins when several could match at
/// the same position. Re-registering a token overwrites its value but keeps
/// its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplacementSet {
    entries: Vec<Replacement>,
}

impl ReplacementSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a replacement; returns the previous value when the token was already present
    pub fn insert(
        &mut self,
        token: impl Into<String>,
        value: impl Into<ReplacementValue>,
    ) -> Option<ReplacementValue> {
        let token = token.into();
        let value = value.into();
        match self.entries.iter_mut().find(|entry| entry.token == token) {
            Some(existing) => Some(std::mem::replace(&mut existing.value, value)),
            None => {
                self.entries.push(Replacement { token, value });
                None
            }
        }
    }

    pub fn get(&self, token: &str) -> Option<&ReplacementValue> {
        self.entries
            .iter()
            .find(|entry| entry.token == token)
            .map(|entry| &entry.value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Replacement> {
        self.entries.iter()
    }
}

impl<T, V> FromIterator<(T, V)> for ReplacementSet
where
    T: Into<String>,
    V: Into<ReplacementValue>,
{
    fn from_iter<I: IntoIterator<Item = (T, V)>>(iter: I) -> Self {
        let mut set = ReplacementSet::new();
        for (token, value) in iter {
            set.insert(token, value);
        }
        set
    }
}

impl Extend<Replacement> for ReplacementSet {
    fn extend<I: IntoIterator<Item = Replacement>>(&mut self, iter: I) {
        for replacement in iter {
            self.insert(replacement.token, replacement.value);
        }
    }
}

/// Pixel box an image element is drawn into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBox {
    pub width_px: u32,
    pub height_px: u32,
}

impl ImageBox {
    pub const fn new(width_px: u32, height_px: u32) -> Self {
        Self {
            width_px,
            height_px,
        }
    }
}

/// Standard image size for body images
pub const STANDARD_IMAGE_BOX: ImageBox = ImageBox::new(550, 400);

/// Image size reserved for stamp and seal tokens
pub const STAMP_IMAGE_BOX: ImageBox = ImageBox::new(600, 800);

/// How resolved values are turned into markup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubstitutionOptions {
    /// Size of image elements for ordinary tokens
    pub image: ImageBox,
    /// Size of image elements for stamp tokens
    pub stamp_image: ImageBox,
    /// Tokens whose images are stamps or seals
    pub stamp_tokens: Vec<String>,
}

impl Default for SubstitutionOptions {
    fn default() -> Self {
        Self {
            image: STANDARD_IMAGE_BOX,
            stamp_image: STAMP_IMAGE_BOX,
            stamp_tokens: vec!["{CACHET}".to_string(), "{STAMP}".to_string()],
        }
    }
}

impl SubstitutionOptions {
    /// Image box used for the given token
    pub fn image_box_for(&self, token: &str) -> ImageBox {
        if self.stamp_tokens.iter().any(|stamp| stamp == token) {
            self.stamp_image
        } else {
            self.image
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_recognizes_images_and_sentinel() {
        assert_eq!(
            ReplacementValue::classify("http://x/img.png"),
            ReplacementValue::Image("http://x/img.png".to_string())
        );
        assert!(matches!(
            ReplacementValue::classify("data:image/png;base64,AAAA"),
            ReplacementValue::Image(_)
        ));
        assert_eq!(ReplacementValue::classify("Not Found"), ReplacementValue::NotFound);
        assert_eq!(ReplacementValue::classify(" NOT FOUND\n"), ReplacementValue::NotFound);
        assert_eq!(
            ReplacementValue::classify("not found yet"),
            ReplacementValue::Text("not found yet".to_string())
        );
        assert_eq!(
            ReplacementValue::classify("data:text/plain,hi"),
            ReplacementValue::Text("data:text/plain,hi".to_string())
        );
    }

    #[test]
    fn insert_overwrites_in_place() {
        let mut set = ReplacementSet::new();
        set.insert("{A}", "one");
        set.insert("{B}", "two");
        let previous = set.insert("{A}", "three");

        assert_eq!(previous, Some(ReplacementValue::Text("one".to_string())));
        assert_eq!(set.len(), 2);
        let tokens: Vec<_> = set.iter().map(|r| r.token.as_str()).collect();
        assert_eq!(tokens, ["{A}", "{B}"]);
        assert_eq!(set.get("{A}"), Some(&ReplacementValue::Text("three".to_string())));
    }
}
