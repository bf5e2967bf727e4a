//! Scanner for the commented gear sections of a simulation input text.
//!
//! Sections look like:
//!
//! ```text
//! ### Gear from Bags
//! #
//! # Void Reaper's Contract (662)
//! # trinket1=,id=212456,bonus_id=10390/11991/1492
//! #
//! ### Weekly Reward Choices
//! ...
//! ### End of Weekly Reward Choices
//! ```
//!
//! A section runs from its header to the next `###` line. A missing section
//! is an empty result.

pub const BAG_SECTION: &str = "### Gear from Bags";
pub const VAULT_SECTION: &str = "### Weekly Reward Choices";

/// One item line with the name/level comment that preceded it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextItem {
    pub slot_key: String,
    pub item_id: u32,
    pub item_level: Option<u32>,
    pub name: Option<String>,
    pub bonus_ids: Vec<u32>,
    pub enchant_ids: Vec<u32>,
    pub gem_ids: Vec<u32>,
    pub crafted_stats: Vec<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionScan {
    pub items: Vec<TextItem>,
    /// `(line, reason)` for item lines that could not be parsed.
    pub malformed: Vec<(String, String)>,
}

pub fn scan_section(text: &str, header: &str) -> SectionScan {
    let mut scan = SectionScan::default();
    let mut lines = text.lines().map(str::trim);

    if !lines.any(|line| line.eq_ignore_ascii_case(header)) {
        return scan;
    }

    let mut pending: Option<(String, Option<u32>)> = None;
    for line in lines {
        if line.starts_with("###") {
            break;
        }
        let Some(body) = line.strip_prefix('#').map(str::trim) else {
            continue;
        };
        if body.is_empty() {
            continue;
        }

        if is_item_line(body) {
            let (name, level) = pending.take().unzip();
            match parse_item_line(body) {
                Ok(mut item) => {
                    item.name = name;
                    if item.item_level.is_none() {
                        item.item_level = level.flatten();
                    }
                    scan.items.push(item);
                }
                Err(reason) => scan.malformed.push((body.to_string(), reason)),
            }
        } else {
            pending = Some(parse_label(body));
        }
    }
    scan
}

/// `slot=,id=...`: an equals sign before the first comma.
fn is_item_line(body: &str) -> bool {
    body.split(',')
        .next()
        .is_some_and(|first| first.ends_with('=') && body.contains("id="))
}

/// `Some Item Name (662)` → name + level.
fn parse_label(body: &str) -> (String, Option<u32>) {
    if let (Some(open), true) = (body.rfind('('), body.ends_with(')')) {
        if let Ok(level) = body[open + 1..body.len() - 1].trim().parse::<u32>() {
            return (body[..open].trim().to_string(), Some(level));
        }
    }
    (body.to_string(), None)
}

fn parse_item_line(body: &str) -> Result<TextItem, String> {
    let mut parts = body.split(',');
    let slot_key = parts
        .next()
        .and_then(|first| first.strip_suffix('='))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "missing slot".to_string())?;

    let mut item = TextItem {
        slot_key,
        ..TextItem::default()
    };
    let mut saw_id = false;

    for part in parts {
        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "id" => {
                item.item_id = value.parse().map_err(|_| format!("bad item id '{value}'"))?;
                saw_id = true;
            }
            "ilevel" => {
                item.item_level = Some(value.parse().map_err(|_| format!("bad ilevel '{value}'"))?);
            }
            "bonus_id" => item.bonus_ids = super::split_ids(value)?,
            "enchant_id" => item.enchant_ids = super::split_ids(value)?,
            "gem_id" => item.gem_ids = super::split_ids(value)?,
            "crafted_stats" => item.crafted_stats = super::split_ids(value)?,
            _ => {}
        }
    }

    if !saw_id || item.item_id == 0 {
        return Err("missing item id".into());
    }
    Ok(item)
}
