//! Resume document model.
//!
//! Section content arrives as loosely shaped JSON keyed by a string `type`.
//! It is parsed once, at the edge, into [`SectionContent`]: one strongly typed
//! payload per known kind, plus [`SectionContent::Unknown`] for kinds this
//! service does not render. Malformed payloads never fail the whole document:
//! `null` or mis-typed scalar fields read as blank, list entries that are not
//! objects are dropped, and a payload of the wrong shape demotes its section to
//! `Unknown`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

// ────────────────────────────────────────────────────────────────────────────
// Document
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    #[default]
    Draft,
    Compiling,
    Compiled,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeDocument {
    pub id: Uuid,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_template_id")]
    pub template_id: String,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub status: DocumentStatus,
    #[serde(default)]
    pub artifact_key: Option<String>,
}

fn default_template_id() -> String {
    "default".to_string()
}

// ────────────────────────────────────────────────────────────────────────────
// Sections
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    PersonalInfo,
    Summary,
    Experience,
    Leadership,
    Education,
    Projects,
    Skills,
    Certifications,
    Awards,
}

impl SectionKind {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "personal-info" => Some(Self::PersonalInfo),
            "summary" => Some(Self::Summary),
            "experience" => Some(Self::Experience),
            "leadership" => Some(Self::Leadership),
            "education" => Some(Self::Education),
            "projects" => Some(Self::Projects),
            "skills" => Some(Self::Skills),
            "certifications" => Some(Self::Certifications),
            "awards" => Some(Self::Awards),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PersonalInfo => "personal-info",
            Self::Summary => "summary",
            Self::Experience => "experience",
            Self::Leadership => "leadership",
            Self::Education => "education",
            Self::Projects => "projects",
            Self::Skills => "skills",
            Self::Certifications => "certifications",
            Self::Awards => "awards",
        }
    }

    /// Heading printed above the section in both the typeset and plain renderings.
    pub fn heading(&self) -> &'static str {
        match self {
            Self::PersonalInfo => "Contact",
            Self::Summary => "Summary",
            Self::Experience => "Experience",
            Self::Leadership => "Leadership",
            Self::Education => "Education",
            Self::Projects => "Projects",
            Self::Skills => "Skills",
            Self::Certifications => "Certifications",
            Self::Awards => "Awards",
        }
    }
}

/// One resume section. Deserialized through [`RawSection`] so that content
/// shape errors degrade instead of rejecting the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawSection", into = "RawSection")]
pub struct Section {
    pub id: String,
    pub content: SectionContent,
}

#[derive(Debug, Clone)]
pub enum SectionContent {
    PersonalInfo(PersonalInfo),
    Summary(Summary),
    Experience(Vec<ExperienceEntry>),
    Leadership(Vec<ExperienceEntry>),
    Education(Vec<EducationEntry>),
    Projects(Vec<ProjectEntry>),
    Skills(Skills),
    Certifications(Vec<CertificationEntry>),
    Awards(Vec<AwardEntry>),
    /// A tag outside the closed set, or a payload that could not be read.
    /// Skipped by every renderer.
    Unknown(String),
}

impl SectionContent {
    pub fn kind(&self) -> Option<SectionKind> {
        Some(match self {
            Self::PersonalInfo(_) => SectionKind::PersonalInfo,
            Self::Summary(_) => SectionKind::Summary,
            Self::Experience(_) => SectionKind::Experience,
            Self::Leadership(_) => SectionKind::Leadership,
            Self::Education(_) => SectionKind::Education,
            Self::Projects(_) => SectionKind::Projects,
            Self::Skills(_) => SectionKind::Skills,
            Self::Certifications(_) => SectionKind::Certifications,
            Self::Awards(_) => SectionKind::Awards,
            Self::Unknown(_) => return None,
        })
    }
}

/// Wire shape of a section: `{ "id", "type", "content" }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSection {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: Value,
}

impl TryFrom<RawSection> for Section {
    // Never fails; `try_from` is used only to route deserialization through RawSection.
    type Error = std::convert::Infallible;

    fn try_from(raw: RawSection) -> Result<Self, Self::Error> {
        let content = parse_content(&raw.kind, raw.content).unwrap_or_else(|| {
            warn!(
                "Section {:?} of type {:?} is unrecognised or malformed; it will be skipped",
                raw.id, raw.kind
            );
            SectionContent::Unknown(raw.kind.clone())
        });
        Ok(Section {
            id: raw.id,
            content,
        })
    }
}

impl From<Section> for RawSection {
    fn from(section: Section) -> Self {
        let kind = match &section.content {
            SectionContent::Unknown(tag) => tag.clone(),
            other => other.kind().map(|kind| kind.as_str()).unwrap_or_default().to_string(),
        };
        let content = match section.content {
            SectionContent::PersonalInfo(p) => to_value(p),
            SectionContent::Summary(s) => to_value(s),
            SectionContent::Experience(e) | SectionContent::Leadership(e) => to_value(e),
            SectionContent::Education(e) => to_value(e),
            SectionContent::Projects(p) => to_value(p),
            SectionContent::Skills(s) => to_value(s),
            SectionContent::Certifications(c) => to_value(c),
            SectionContent::Awards(a) => to_value(a),
            SectionContent::Unknown(_) => Value::Null,
        };
        RawSection {
            id: section.id,
            kind,
            content,
        }
    }
}

fn to_value<T: Serialize>(payload: T) -> Value {
    serde_json::to_value(payload).unwrap_or(Value::Null)
}

fn parse_content(tag: &str, content: Value) -> Option<SectionContent> {
    let kind = SectionKind::parse(tag)?;
    Some(match kind {
        SectionKind::PersonalInfo => SectionContent::PersonalInfo(parse_object(content)?),
        SectionKind::Summary => SectionContent::Summary(parse_object(content)?),
        SectionKind::Experience => SectionContent::Experience(lenient_list(content, tag)?),
        SectionKind::Leadership => SectionContent::Leadership(lenient_list(content, tag)?),
        SectionKind::Education => SectionContent::Education(lenient_list(content, tag)?),
        SectionKind::Projects => SectionContent::Projects(lenient_list(content, tag)?),
        SectionKind::Skills => SectionContent::Skills(parse_object(content)?),
        SectionKind::Certifications => {
            SectionContent::Certifications(lenient_list(content, tag)?)
        }
        SectionKind::Awards => SectionContent::Awards(lenient_list(content, tag)?),
    })
}

fn parse_object<T: DeserializeOwned + Default>(content: Value) -> Option<T> {
    if content.is_null() {
        return Some(T::default());
    }
    serde_json::from_value(content).ok()
}

/// Reads a list payload (a bare array or `{ "entries": [...] }`), keeping the
/// entries that parse and dropping the rest. `None` if the payload is not a list at all.
fn lenient_list<T: DeserializeOwned>(content: Value, tag: &str) -> Option<Vec<T>> {
    let items = match content {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("entries") {
            Some(Value::Array(items)) => items,
            _ => return None,
        },
        Value::Null => Vec::new(),
        _ => return None,
    };

    let total = items.len();
    let parsed: Vec<T> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();

    if parsed.len() < total {
        warn!(
            "Dropped {} malformed {tag} entries out of {total}",
            total - parsed.len()
        );
    }
    Some(parsed)
}

// ────────────────────────────────────────────────────────────────────────────
// Payloads
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    #[serde(deserialize_with = "lenient_string")]
    pub full_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(deserialize_with = "lenient_string")]
    pub phone: String,
    #[serde(deserialize_with = "lenient_string")]
    pub location: String,
    #[serde(deserialize_with = "lenient_vec")]
    pub links: Vec<Link>,
}

/// A profile link. Accepts either `"https://..."` or `{ "label", "url" }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Link {
    Bare(String),
    Labeled {
        #[serde(default, deserialize_with = "lenient_string")]
        label: String,
        url: String,
    },
}

impl Link {
    pub fn url(&self) -> &str {
        match self {
            Link::Bare(url) => url,
            Link::Labeled { url, .. } => url,
        }
    }

    /// Visible text: the label if one was given, otherwise the URL itself.
    pub fn label(&self) -> &str {
        match self {
            Link::Labeled { label, .. } if !label.trim().is_empty() => label,
            _ => self.url(),
        }
    }
}

/// Summary text. Accepts a bare string or `{ "text": "..." }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Summary {
    Text(String),
    Object {
        #[serde(default, deserialize_with = "lenient_string")]
        text: String,
    },
}

impl Default for Summary {
    fn default() -> Self {
        Summary::Text(String::new())
    }
}

impl Summary {
    pub fn text(&self) -> &str {
        match self {
            Summary::Text(text) => text,
            Summary::Object { text } => text,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Bullet {
    #[serde(deserialize_with = "lenient_string")]
    pub text: String,
}

/// Shared shape of `experience` and `leadership` entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExperienceEntry {
    #[serde(deserialize_with = "lenient_string")]
    pub company: String,
    #[serde(deserialize_with = "lenient_string")]
    pub location: String,
    #[serde(deserialize_with = "lenient_string")]
    pub role: String,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub additional_role: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub start_date: String,
    /// Blank or `null` while the position is ongoing.
    #[serde(deserialize_with = "lenient_string")]
    pub end_date: String,
    #[serde(deserialize_with = "lenient_vec")]
    pub bullets: Vec<Bullet>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectEntry {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub technologies: String,
    #[serde(deserialize_with = "lenient_string")]
    pub link: String,
    #[serde(deserialize_with = "lenient_string")]
    pub start_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub end_date: String,
    #[serde(deserialize_with = "lenient_vec")]
    pub bullets: Vec<Bullet>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EducationEntry {
    #[serde(deserialize_with = "lenient_string")]
    pub institution: String,
    #[serde(deserialize_with = "lenient_string")]
    pub location: String,
    #[serde(deserialize_with = "lenient_string")]
    pub degree: String,
    #[serde(deserialize_with = "lenient_string")]
    pub start_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub end_date: String,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub gpa: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub details: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CertificationEntry {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub issuer: String,
    #[serde(deserialize_with = "lenient_string")]
    pub date: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AwardEntry {
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(deserialize_with = "lenient_string")]
    pub issuer: String,
    #[serde(deserialize_with = "lenient_string")]
    pub date: String,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Skills {
    #[serde(deserialize_with = "lenient_vec")]
    pub categories: Vec<SkillCategory>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SkillCategory {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_vec")]
    pub keywords: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Lenient field readers
//
// `#[serde(default)]` only covers absent fields. Editors routinely send `null`
// for cleared inputs and numbers for years, so scalar fields and lists are
// read through these instead of failing the surrounding entry.
// ────────────────────────────────────────────────────────────────────────────

/// Text from a string, number or boolean; empty for `null` and anything else.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?).unwrap_or_default())
}

/// Like [`lenient_string`], but `null`, blanks and non-scalars become `None`.
fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?).filter(|text| !text.trim().is_empty()))
}

/// A list whose unreadable items (including `null`) are dropped one by one.
/// `null` or a non-list yields an empty list.
fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn section(value: Value) -> Section {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_known_kinds_parse_to_typed_payloads() {
        let s = section(json!({
            "id": "s1",
            "type": "experience",
            "content": [{
                "company": "Acme",
                "location": "Remote",
                "role": "Engineer",
                "startDate": "2020",
                "endDate": "2023",
                "bullets": [{ "text": "Built things" }]
            }]
        }));
        match s.content {
            SectionContent::Experience(entries) => {
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].company, "Acme");
                assert_eq!(entries[0].bullets[0].text, "Built things");
                assert!(entries[0].additional_role.is_none());
            }
            other => panic!("expected experience, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_type_becomes_unknown_variant() {
        let s = section(json!({ "id": "x", "type": "hobbies", "content": ["chess"] }));
        assert!(matches!(s.content, SectionContent::Unknown(ref k) if k == "hobbies"));
        assert!(s.content.kind().is_none());
    }

    #[test]
    fn test_wrong_shape_payload_is_demoted_not_rejected() {
        let s = section(json!({ "id": "e", "type": "experience", "content": "oops" }));
        assert!(matches!(s.content, SectionContent::Unknown(_)));
    }

    #[test]
    fn test_malformed_entries_are_dropped_individually() {
        let s = section(json!({
            "id": "c",
            "type": "certifications",
            "content": { "entries": [
                { "name": "CKA", "issuer": "CNCF", "date": "2022" },
                "not an entry",
                null,
                { "name": "AWS SAA", "date": 2023 }
            ]}
        }));
        match s.content {
            SectionContent::Certifications(entries) => {
                assert_eq!(entries.len(), 2);
                assert_eq!(entries[0].name, "CKA");
                assert_eq!(entries[1].name, "AWS SAA");
                assert_eq!(entries[1].date, "2023");
                assert_eq!(entries[1].issuer, "");
            }
            other => panic!("expected certifications, got {other:?}"),
        }
    }

    #[test]
    fn test_summary_accepts_bare_string_and_object() {
        let a = section(json!({ "id": "a", "type": "summary", "content": "Hello" }));
        let b = section(json!({ "id": "b", "type": "summary", "content": { "text": "Hi" } }));
        match (a.content, b.content) {
            (SectionContent::Summary(a), SectionContent::Summary(b)) => {
                assert_eq!(a.text(), "Hello");
                assert_eq!(b.text(), "Hi");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_links_accept_bare_and_labeled_forms() {
        let s = section(json!({
            "id": "p",
            "type": "personal-info",
            "content": {
                "fullName": "Jane Doe",
                "links": ["https://jane.dev", { "label": "GitHub", "url": "https://github.com/jane" }]
            }
        }));
        match s.content {
            SectionContent::PersonalInfo(info) => {
                assert_eq!(info.full_name, "Jane Doe");
                assert_eq!(info.links[0].label(), "https://jane.dev");
                assert_eq!(info.links[1].label(), "GitHub");
                assert_eq!(info.links[1].url(), "https://github.com/jane");
            }
            other => panic!("expected personal-info, got {other:?}"),
        }
    }

    #[test]
    fn test_document_defaults_and_round_trip_keeps_section_order() {
        let doc: ResumeDocument = serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "sections": [
                { "id": "1", "type": "skills", "content": { "categories": [] } },
                { "id": "2", "type": "personal-info", "content": { "fullName": "A B" } }
            ]
        }))
        .unwrap();
        assert_eq!(doc.template_id, "default");
        assert_eq!(doc.status, DocumentStatus::Draft);

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["sections"][0]["type"], "skills");
        assert_eq!(value["sections"][1]["type"], "personal-info");
        assert_eq!(value["sections"][1]["content"]["fullName"], "A B");
    }

    #[test]
    fn test_null_contact_field_keeps_personal_info() {
        let s = section(json!({
            "id": "p",
            "type": "personal-info",
            "content": {
                "fullName": "Jane Doe",
                "phone": null,
                "email": null,
                "location": "Berlin",
                "links": null
            }
        }));
        match s.content {
            SectionContent::PersonalInfo(info) => {
                assert_eq!(info.full_name, "Jane Doe");
                assert_eq!(info.phone, "");
                assert_eq!(info.email, "");
                assert_eq!(info.location, "Berlin");
                assert!(info.links.is_empty());
            }
            other => panic!("expected personal-info, got {other:?}"),
        }
    }

    #[test]
    fn test_null_end_date_keeps_current_position() {
        let s = section(json!({
            "id": "e",
            "type": "experience",
            "content": [{
                "company": "Acme",
                "role": "Engineer",
                "additionalRole": null,
                "startDate": 2021,
                "endDate": null,
                "bullets": [null, { "text": null }, { "text": "Led migration" }]
            }]
        }));
        match s.content {
            SectionContent::Experience(entries) => {
                assert_eq!(entries.len(), 1);
                let entry = &entries[0];
                assert_eq!(entry.company, "Acme");
                assert_eq!(entry.start_date, "2021");
                assert_eq!(entry.end_date, "");
                assert!(entry.additional_role.is_none());
                assert_eq!(entry.bullets.len(), 2);
                assert_eq!(entry.bullets[1].text, "Led migration");
            }
            other => panic!("expected experience, got {other:?}"),
        }
    }

    #[test]
    fn test_null_link_parts_are_tolerated() {
        let s = section(json!({
            "id": "p",
            "type": "personal-info",
            "content": {
                "fullName": "Jane",
                "links": [
                    { "label": null, "url": "https://jane.dev" },
                    { "label": "Broken", "url": null },
                    null
                ]
            }
        }));
        match s.content {
            SectionContent::PersonalInfo(info) => {
                assert_eq!(info.links.len(), 1);
                assert_eq!(info.links[0].label(), "https://jane.dev");
            }
            other => panic!("expected personal-info, got {other:?}"),
        }
    }

    #[test]
    fn test_null_skill_parts_are_tolerated() {
        let s = section(json!({
            "id": "k",
            "type": "skills",
            "content": { "categories": [
                { "name": null, "keywords": ["Rust", null, 42] },
                { "name": "Tools", "keywords": null },
                null
            ]}
        }));
        match s.content {
            SectionContent::Skills(skills) => {
                assert_eq!(skills.categories.len(), 2);
                assert_eq!(skills.categories[0].name, "");
                assert_eq!(skills.categories[0].keywords, vec!["Rust".to_string()]);
                assert!(skills.categories[1].keywords.is_empty());
            }
            other => panic!("expected skills, got {other:?}"),
        }
    }

    #[test]
    fn test_null_summary_text_and_education_options() {
        let summary = section(json!({ "id": "s", "type": "summary", "content": { "text": null } }));
        match summary.content {
            SectionContent::Summary(s) => assert_eq!(s.text(), ""),
            other => panic!("expected summary, got {other:?}"),
        }

        let education = section(json!({
            "id": "e",
            "type": "education",
            "content": [{ "institution": "MIT", "gpa": 3.9, "details": "  ", "endDate": null }]
        }));
        match education.content {
            SectionContent::Education(entries) => {
                assert_eq!(entries[0].institution, "MIT");
                assert_eq!(entries[0].gpa.as_deref(), Some("3.9"));
                assert!(entries[0].details.is_none());
            }
            other => panic!("expected education, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_section_round_trips_its_tag() {
        let s = section(json!({ "id": "h", "type": "hobbies", "content": ["chess"] }));
        let value = serde_json::to_value(&s).unwrap();
        assert_eq!(value["type"], "hobbies");
        assert!(value["content"].is_null());

        let e = section(json!({ "id": "l", "type": "leadership", "content": [] }));
        assert_eq!(serde_json::to_value(&e).unwrap()["type"], "leadership");
    }
}
