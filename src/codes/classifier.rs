/// Activity classification over a store snapshot
///
/// Pure functions of `(now, snapshot)`. Callers capture `now` once per
/// invocation and reuse it for every comparison so a dashboard request
/// reflects one consistent instant.
use crate::store::AccessCode;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One PIN belonging to a person-day summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinEntry {
    pub pin_code: String,
    pub access_code_id: String,
}

/// Deduplicated person-level access summary: one record per
/// (customer email, date), carrying every PIN for that person-day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonAccess {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub date: NaiveDate,
    pub purchase_id: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub codes: Vec<PinEntry>,
}

/// Whether a code is valid at `now`. Closed interval on both ends: a code
/// is active at exactly `starts_at` and at exactly `ends_at`.
pub fn is_active(code: &AccessCode, now: DateTime<Utc>) -> bool {
    now >= code.starts_at && now <= code.ends_at
}

/// Codes valid at `now`
pub fn active_codes(codes: &[AccessCode], now: DateTime<Utc>) -> Vec<&AccessCode> {
    codes.iter().filter(|c| is_active(c, now)).collect()
}

/// Calendar day a code is "for": the explicit date when present, else the
/// UTC calendar date of its start
fn code_date(code: &AccessCode) -> NaiveDate {
    code.date.unwrap_or_else(|| code.starts_at.date_naive())
}

/// Codes belonging to a calendar date
pub fn codes_for_date(codes: &[AccessCode], date: NaiveDate) -> Vec<&AccessCode> {
    codes.iter().filter(|c| code_date(c) == date).collect()
}

/// Group active codes into person-day summaries.
///
/// Keyed by (customer email, date), not code id: two codes for the same
/// person on the same day merge into one record listing both PINs. The
/// result is ordered by date descending; ties keep insertion order.
pub fn people_with_access(codes: &[AccessCode], now: DateTime<Utc>) -> Vec<PersonAccess> {
    let mut index: HashMap<(String, NaiveDate), usize> = HashMap::new();
    let mut people: Vec<PersonAccess> = Vec::new();

    for code in codes.iter().filter(|c| is_active(c, now)) {
        let key = (code.customer_email.clone(), code_date(code));
        let entry = PinEntry {
            pin_code: code.pin_code.clone(),
            access_code_id: code.id.clone(),
        };

        match index.get(&key) {
            Some(&i) => people[i].codes.push(entry),
            None => {
                index.insert(key, people.len());
                people.push(PersonAccess {
                    name: code.customer_name.clone(),
                    email: code.customer_email.clone(),
                    phone: code.customer_phone.clone(),
                    date: code_date(code),
                    purchase_id: code.purchase_id.clone(),
                    starts_at: code.starts_at,
                    ends_at: code.ends_at,
                    codes: vec![entry],
                });
            }
        }
    }

    // Stable: equal dates stay in insertion order
    people.sort_by(|a, b| b.date.cmp(&a.date));
    people
}
