//! Header classification for uploaded tables.
//!
//! Exports come from property-management tools, spreadsheets typed by hand and
//! mail clients, so headers vary wildly ("Apt #", "E-Mail Address",
//! "Tenant Name"). Headers are normalized to lower-case words before matching
//! so punctuation and spacing never matter.

use common::model::columns::ColumnRole;

/// Lower-cases `title` and collapses every run of non-alphanumeric
/// characters into a single space.
pub fn normalize_header(title: &str) -> String {
    title
        .trim()
        .trim_start_matches('\u{feff}')
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Maps one header cell to the resident field it most likely holds.
pub fn classify(title: &str) -> Option<ColumnRole> {
    let h = normalize_header(title);
    let role = match h.as_str() {
        "" => return None,
        "name" | "full name" | "fullname" | "resident" | "resident name" | "tenant"
        | "tenant name" | "occupant" | "occupant name" | "contact" | "contact name"
        | "owner" | "owner name" | "display name" => ColumnRole::Name,
        "first" | "first name" | "firstname" | "given name" | "forename" => ColumnRole::FirstName,
        "last" | "last name" | "lastname" | "surname" | "family name" => ColumnRole::LastName,
        "email" | "e mail" | "mail" | "email address" | "e mail address" | "emailaddress"
        | "email addr" => ColumnRole::Email,
        "unit" | "unit no" | "unit number" | "unit num" | "unit id" | "apt" | "apt no"
        | "apartment" | "apartment number" | "suite" | "ste" | "flat" | "room" | "door" => {
            ColumnRole::Unit
        }
        "phone" | "phone number" | "phone no" | "telephone" | "tel" | "mobile" | "mobile number"
        | "cell" | "cell phone" | "cellphone" => ColumnRole::Phone,
        _ => return classify_loosely(&h),
    };
    Some(role)
}

fn classify_loosely(h: &str) -> Option<ColumnRole> {
    let words: Vec<&str> = h.split(' ').collect();
    let has = |w: &str| words.contains(&w);

    if h.contains("email") || h.contains("e mail") {
        Some(ColumnRole::Email)
    } else if has("phone") || has("mobile") || has("cell") || has("telephone") {
        Some(ColumnRole::Phone)
    } else if has("unit") || has("apt") || has("apartment") || has("suite") {
        Some(ColumnRole::Unit)
    } else if has("name") {
        if has("first") || has("given") {
            Some(ColumnRole::FirstName)
        } else if has("last") || has("family") {
            Some(ColumnRole::LastName)
        } else if has("building") || has("property") || has("company") {
            None
        } else {
            Some(ColumnRole::Name)
        }
    } else {
        None
    }
}
