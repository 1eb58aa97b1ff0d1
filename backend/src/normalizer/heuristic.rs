use super::{Organizer, OrganizerError};
use async_trait::async_trait;
use common::model::resident::ParsedResident;
use common::quick_add::name_from_email;
use regex::Regex;

/// Local, line-oriented stand-in for the organizer, used in demo mode.
///
/// Each non-empty line becomes at most one resident: the first address, the
/// first unit marker ("unit 4B", "apt 7", "#12") and the first phone-like
/// digit run are pulled out, and whatever text is left is the name.
pub struct HeuristicOrganizer {
    email: Regex,
    unit: Regex,
    phone: Regex,
}

impl HeuristicOrganizer {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            email: Regex::new(r"[A-Za-z0-9._%+'\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}")?,
            unit: Regex::new(r"(?i)(?:\b(?:unit|apt|apartment|suite|ste)\b\.?\s*#?|#)\s*([A-Za-z0-9\-]+)")?,
            phone: Regex::new(r"\+?\d[\d\s().\-]{5,}\d")?,
        })
    }

    fn parse_line(&self, line: &str) -> Option<ParsedResident> {
        let mut rest = line.to_string();

        let email = self.email.find(&rest).map(|m| m.as_str().to_string());
        if let Some(e) = &email {
            rest = rest.replacen(e.as_str(), " ", 1);
        }
        let unit = self.unit.captures(&rest).map(|c| {
            let whole = c.get(0).map(|m| m.as_str().to_string()).unwrap_or_default();
            let value = c.get(1).map(|m| m.as_str().to_string()).unwrap_or_default();
            (whole, value)
        });
        if let Some((whole, _)) = &unit {
            rest = rest.replacen(whole.as_str(), " ", 1);
        }
        let phone = self.phone.find(&rest).map(|m| m.as_str().trim().to_string());
        if let Some(p) = &phone {
            rest = rest.replacen(p.as_str(), " ", 1);
        }

        let mut name = rest
            .split(|c: char| c.is_whitespace() || ",;|<>()[]:".contains(c))
            .map(|w| w.trim_matches(|c: char| c == '-' || c == '.'))
            .filter(|w| !w.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let email = email.unwrap_or_default();
        if name.is_empty() && !email.is_empty() {
            name = name_from_email(&email);
        }

        let resident = ParsedResident {
            name,
            email,
            unit: unit.map(|(_, v)| v).unwrap_or_default(),
            phone: phone.unwrap_or_default(),
        };
        (!resident.is_blank()).then_some(resident)
    }
}

#[async_trait]
impl Organizer for HeuristicOrganizer {
    async fn organize(&self, raw_text: &str) -> Result<Vec<ParsedResident>, OrganizerError> {
        Ok(raw_text
            .lines()
            .filter_map(|line| self.parse_line(line))
            .collect())
    }
}
