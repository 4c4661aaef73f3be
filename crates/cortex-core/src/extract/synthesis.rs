//! File-role-aware summary facts.
//!
//! Atomic key-value facts answer precise queries. This pass adds a few
//! consolidated facts per recognized file so broad queries ("who is the
//! user", "what are we working on") also have a direct hit. It only ever
//! adds facts.

use regex::Regex;
use std::sync::LazyLock;

use super::sections::{heading_text, is_fence, split_sections};
use super::strategies::parse_key_value;
use crate::text::truncate;
use crate::types::{CandidateFact, FileType, Shard};

/// Minimum number of matched fields before a profile fact is emitted.
pub const MIN_PROFILE_FIELDS: usize = 2;

const MAX_FIELD_CHARS: usize = 80;
const MAX_LIST_ENTRIES: usize = 12;

/// A display name and the labels that fill it.
struct Field {
    name: &'static str,
    regex: Regex,
}

fn labeled(name: &'static str, labels: &str) -> Option<Field> {
    let pattern = format!(
        r"(?im)^[ \t]*(?:[-*+][ \t]+)?\**[ \t]*(?:{})[ \t]*\**[ \t]*:[ \t]*\**[ \t]*(\S.*?)[ \t]*$",
        labels
    );
    Regex::new(&pattern).ok().map(|regex| Field { name, regex })
}

static USER_FIELDS: LazyLock<Vec<Field>> = LazyLock::new(|| {
    [
        labeled("Name", "name|full name|preferred name|what to call them"),
        labeled("Role", "role|title|job|occupation|position"),
        labeled("Location", "location|city|based in|lives in"),
        labeled("Timezone", "timezone|time zone|tz"),
        labeled("Business", "business|company|employer|works at"),
        labeled("Pronouns", "pronouns"),
    ]
    .into_iter()
    .flatten()
    .collect()
});

static IDENTITY_FIELDS: LazyLock<Vec<Field>> = LazyLock::new(|| {
    [
        labeled("Name", "name"),
        labeled("Role", "role|purpose"),
        labeled("Creature", "creature|species|what i am"),
        labeled("Hardware", "hardware|host|machine|runs on"),
        labeled("Vibe", "vibe|personality|tone"),
        labeled("Emoji", "emoji|signature emoji"),
    ]
    .into_iter()
    .flatten()
    .collect()
});

static MEMORY_FIELDS: LazyLock<Vec<Field>> = LazyLock::new(|| {
    [
        labeled("Revenue", "revenue|mrr|arr|income"),
        labeled("Clients", "clients|customers|client count|active clients"),
        labeled("Target", "target|goal|revenue target|north star"),
    ]
    .into_iter()
    .flatten()
    .collect()
});

/// Behavior flags recognized in personality files.
static SOUL_TRAITS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("prefers brevity", r"(?i)\b(?:concise|brevity|brief|terse|short answers?)\b"),
        ("has opinions", r"(?i)\b(?:opinions?|opinionated|disagree|push back)\b"),
        ("uses humor", r"(?i)\b(?:humou?r|funny|jokes?|witty|wit)\b"),
        ("stays honest", r"(?i)\b(?:honest|candid|blunt|no sycophancy)\b"),
    ]
    .into_iter()
    .filter_map(|(name, p)| Regex::new(p).ok().map(|r| (name, r)))
    .collect()
});

static SPOUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?i:wife|husband|spouse|partner)\b\**[ \t]*(?::|(?i:is)|-)?[ \t]*\**[ \t]*(?:named[ \t]+)?([A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)?)",
    )
    .expect("spouse regex")
});

static CHILDREN_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:kids|children|sons?|daughters?)\b\**\s*(?::\**\s*(.*))?$").expect("children regex")
});

static SKILLS_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:skills|expertise|strengths)\b").expect("skills regex"));

fn clean(value: &str) -> String {
    truncate(value.trim().trim_matches('*').trim(), MAX_FIELD_CHARS)
}

fn collect_fields(text: &str, fields: &[Field]) -> Vec<(&'static str, String)> {
    fields
        .iter()
        .filter_map(|f| {
            f.regex
                .captures(text)
                .and_then(|c| c.get(1))
                .map(|m| clean(m.as_str()))
                .filter(|v| !v.is_empty())
                .map(|v| (f.name, v))
        })
        .collect()
}

fn profile_fact(
    trigger: String,
    heading: &str,
    fields: &[(&'static str, String)],
) -> Option<CandidateFact> {
    if fields.len() < MIN_PROFILE_FIELDS {
        return None;
    }
    let body: Vec<String> = fields.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
    let content = format!("{}. {}.", heading, body.join("; "));
    Some(CandidateFact::new(trigger, content).with_shard(Shard::Semantic))
}

fn name_of<'a>(fields: &'a [(&'static str, String)]) -> Option<&'a str> {
    fields.iter().find(|(k, _)| *k == "Name").map(|(_, v)| v.as_str())
}

/// Leading bullet items of `lines`, stopping at the first non-bullet line.
fn bullet_items(lines: &[&str]) -> Vec<String> {
    lines
        .iter()
        .skip_while(|l| l.trim().is_empty())
        .take_while(|l| {
            let t = l.trim_start();
            t.starts_with("- ") || t.starts_with("* ") || t.starts_with("+ ")
        })
        .map(|l| clean(&l.trim_start()[2..]))
        .filter(|s| !s.is_empty())
        .take(MAX_LIST_ENTRIES)
        .collect()
}

fn split_inline(list: &str) -> Vec<String> {
    list.split([',', ';'])
        .flat_map(|part| part.split(" and "))
        .map(clean)
        .filter(|s| !s.is_empty())
        .take(MAX_LIST_ENTRIES)
        .collect()
}

fn family_fact(text: &str, subject: &str) -> Option<CandidateFact> {
    let spouse = SPOUSE.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str().to_string());

    let lines: Vec<&str> = text.lines().collect();
    let mut children = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let Some(caps) = CHILDREN_LABEL.captures(line.trim_end()) else {
            continue;
        };
        children = match caps.get(1).map(|m| m.as_str().trim()) {
            Some(inline) if !inline.is_empty() => split_inline(inline),
            _ => bullet_items(&lines[i + 1..]),
        };
        if !children.is_empty() {
            break;
        }
    }

    let mut parts = Vec::new();
    if let Some(spouse) = spouse {
        parts.push(format!("spouse {}", spouse));
    }
    if !children.is_empty() {
        parts.push(format!("children {}", children.join(", ")));
    }
    if parts.is_empty() {
        return None;
    }
    Some(
        CandidateFact::new(
            format!("{} family members", subject),
            format!("{} family: {}.", subject, parts.join("; ")),
        )
        .with_shard(Shard::Semantic),
    )
}

fn skills_fact(text: &str, subject: &str) -> Option<CandidateFact> {
    let mut skills: Vec<String> = split_sections(text, "")
        .into_iter()
        .filter(|s| SKILLS_LABEL.is_match(&s.label))
        .flat_map(|s| {
            let lines: Vec<&str> = s.body.lines().collect();
            bullet_items(&lines)
        })
        .collect();

    if skills.is_empty() {
        skills = text
            .lines()
            .filter_map(parse_key_value)
            .find(|(label, _)| SKILLS_LABEL.is_match(label))
            .map(|(_, value)| split_inline(&value))
            .unwrap_or_default();
    }

    if skills.is_empty() {
        return None;
    }
    skills.truncate(MAX_LIST_ENTRIES);
    Some(
        CandidateFact::new(
            format!("{} skills", subject),
            format!("{} skills: {}.", subject, skills.join(", ")),
        )
        .with_shard(Shard::Semantic),
    )
}

fn projects_fact(text: &str) -> Option<CandidateFact> {
    let mut in_fence = false;
    let mut projects = Vec::new();
    for line in text.lines() {
        if is_fence(line) {
            in_fence = !in_fence;
            continue;
        }
        if in_fence || !line.trim_start().starts_with("### ") {
            continue;
        }
        if let Some(heading) = heading_text(line) {
            projects.push(clean(heading));
        }
    }
    if projects.is_empty() {
        return None;
    }
    projects.truncate(MAX_LIST_ENTRIES);
    Some(
        CandidateFact::new(
            "Active projects",
            format!("Active projects: {}.", projects.join(", ")),
        )
        .with_shard(Shard::Semantic),
    )
}

/// Summary facts for a file of the given role.
pub fn synthesize(text: &str, file_type: FileType) -> Vec<CandidateFact> {
    let mut facts = Vec::new();
    match file_type {
        FileType::User => {
            let fields = collect_fields(text, &USER_FIELDS);
            let subject = name_of(&fields).unwrap_or("The user").to_string();
            facts.extend(profile_fact(
                format!("Who is {}", subject),
                "User profile",
                &fields,
            ));
            facts.extend(family_fact(text, &subject));
            facts.extend(skills_fact(text, &subject));
        }
        FileType::Identity => {
            let fields = collect_fields(text, &IDENTITY_FIELDS);
            let subject = name_of(&fields).unwrap_or("The agent").to_string();
            facts.extend(profile_fact(
                format!("Agent identity: who is {}", subject),
                "Agent identity",
                &fields,
            ));
            facts.extend(family_fact(text, &subject));
            facts.extend(skills_fact(text, &subject));
        }
        FileType::Soul => {
            let traits: Vec<&str> = SOUL_TRAITS
                .iter()
                .filter(|(_, r)| r.is_match(text))
                .map(|(name, _)| *name)
                .collect();
            if traits.len() >= MIN_PROFILE_FIELDS {
                facts.push(
                    CandidateFact::new(
                        "Agent personality and communication style",
                        format!("Personality profile: {}.", traits.join("; ")),
                    )
                    .with_shard(Shard::Semantic),
                );
            }
        }
        FileType::Memory => {
            let fields = collect_fields(text, &MEMORY_FIELDS);
            facts.extend(profile_fact(
                "Business snapshot".to_string(),
                "Business snapshot",
                &fields,
            ));
            facts.extend(projects_fact(text));
        }
        _ => {}
    }
    facts
}
