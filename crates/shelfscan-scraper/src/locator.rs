//! Element locators parsed from selector strings.
//!
//! A selector string is `[strategy:]value[@attribute]`:
//!
//! | String | Matches | Reads |
//! |---|---|---|
//! | `#productTitle` | CSS `#productTitle` | text |
//! | `css:.a-price .a-offscreen` | CSS `.a-price .a-offscreen` | text |
//! | `id:add-to-cart-button` | element with that `id` | text |
//! | `name:quantity` | element with that `name` | text |
//! | `#landingImage@src` | CSS `#landingImage` | `src` attribute |
//!
//! Every strategy lowers to a CSS selector so all page drivers share one
//! query language.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Css,
    Id,
    Name,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    strategy: Strategy,
    value: String,
    attribute: Option<String>,
}

impl Locator {
    #[must_use]
    pub fn css(value: impl Into<String>) -> Self {
        Self::new(Strategy::Css, value)
    }

    #[must_use]
    pub fn id(value: impl Into<String>) -> Self {
        Self::new(Strategy::Id, value)
    }

    #[must_use]
    pub fn name(value: impl Into<String>) -> Self {
        Self::new(Strategy::Name, value)
    }

    fn new(strategy: Strategy, value: impl Into<String>) -> Self {
        Self {
            strategy,
            value: value.into(),
            attribute: None,
        }
    }

    /// Read `attribute` from the matched element instead of its text.
    #[must_use]
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// Parses a configured selector string. Never fails; CSS syntax is
    /// checked by the page driver when the locator is used.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let (body, attribute) = split_attribute(raw);

        let (strategy, value) = if let Some(rest) = body.strip_prefix("id:") {
            (Strategy::Id, rest)
        } else if let Some(rest) = body.strip_prefix("name:") {
            (Strategy::Name, rest)
        } else if let Some(rest) = body.strip_prefix("css:") {
            (Strategy::Css, rest)
        } else {
            (Strategy::Css, body)
        };

        Self {
            strategy,
            value: value.trim().to_owned(),
            attribute: attribute.map(str::to_owned),
        }
    }

    #[must_use]
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    #[must_use]
    pub fn attribute(&self) -> Option<&str> {
        self.attribute.as_deref()
    }

    /// The CSS selector this locator resolves through.
    #[must_use]
    pub fn to_css(&self) -> String {
        match self.strategy {
            Strategy::Css => self.value.clone(),
            Strategy::Id => format!("[id=\"{}\"]", escape_css_string(&self.value)),
            Strategy::Name => format!("[name=\"{}\"]", escape_css_string(&self.value)),
        }
    }
}

impl From<&str> for Locator {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.strategy {
            Strategy::Css => write!(f, "{}", self.value)?,
            Strategy::Id => write!(f, "id:{}", self.value)?,
            Strategy::Name => write!(f, "name:{}", self.value)?,
        }
        if let Some(attribute) = &self.attribute {
            write!(f, "@{attribute}")?;
        }
        Ok(())
    }
}

/// Parses a configured selector list, preserving order.
#[must_use]
pub fn parse_all(raw: &[String]) -> Vec<Locator> {
    raw.iter().map(|s| Locator::parse(s)).collect()
}

/// Splits a trailing `@attribute` off a selector string.
///
/// The `@` only counts when it sits outside `[...]` and the remainder is a
/// plain attribute name, so `a[href*='@']` stays intact.
fn split_attribute(raw: &str) -> (&str, Option<&str>) {
    let Some(at) = raw.rfind('@') else {
        return (raw, None);
    };
    let (body, attribute) = (&raw[..at], &raw[at + 1..]);

    let is_name = !attribute.is_empty()
        && attribute
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':'));
    let depth = body.chars().fold(0i32, |depth, c| match c {
        '[' => depth + 1,
        ']' => depth - 1,
        _ => depth,
    });

    if is_name && depth == 0 && !body.trim().is_empty() {
        (body, Some(attribute))
    } else {
        (raw, None)
    }
}

fn escape_css_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
