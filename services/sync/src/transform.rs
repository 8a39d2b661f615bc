use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::hubspot::models::RawRecord;

/// Companies report timestamps slightly ahead of the contact-generated events
/// they pair with; their action dates are pulled back by this much.
const COMPANY_CLOCK_SKEW_MS: i64 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Contact,
    Company,
    Meeting,
}

/// Static per-entity-type configuration: where to search, which property
/// carries the last-modified timestamp, and which properties to request.
#[derive(Debug, Clone, Copy)]
pub struct EntityDescriptor {
    pub kind: EntityKind,
    pub name: &'static str,
    pub last_modified_property: &'static str,
    pub properties: &'static [&'static str],
}

pub const ENTITIES: [EntityDescriptor; 3] = [
    EntityDescriptor {
        kind: EntityKind::Contact,
        name: "contacts",
        last_modified_property: "lastmodifieddate",
        properties: &[
            "firstname",
            "lastname",
            "jobtitle",
            "email",
            "hubspotscore",
            "hs_lead_status",
            "hs_analytics_source",
            "hs_latest_source",
        ],
    },
    EntityDescriptor {
        kind: EntityKind::Company,
        name: "companies",
        last_modified_property: "hs_lastmodifieddate",
        properties: &[
            "name",
            "domain",
            "country",
            "industry",
            "description",
            "annualrevenue",
            "numberofemployees",
            "hs_lead_status",
        ],
    },
    EntityDescriptor {
        kind: EntityKind::Meeting,
        name: "meetings",
        last_modified_property: "hs_lastmodifieddate",
        properties: &["hs_meeting_title", "hs_timestamp"],
    },
];

/// A normalized behavioral event bound for the analytics sink. Property bags
/// never contain nulls; absent source values are simply not carried.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionEvent {
    pub action_name: String,
    pub action_date: DateTime<Utc>,
    pub include_in_analytics: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    pub properties: HashMap<String, Value>,
}

/// Created if the record appeared strictly after the watermark, or if no
/// watermark exists yet.
fn is_created(created_at: DateTime<Utc>, watermark: Option<DateTime<Utc>>) -> bool {
    watermark.map_or(true, |w| created_at > w)
}

fn prop(props: &HashMap<String, Option<String>>, key: &str) -> Option<String> {
    props.get(key).and_then(|v| v.clone())
}

/// Transform one contact record. Contacts without an email are skipped.
pub fn transform_contact(
    record: &RawRecord,
    watermark: Option<DateTime<Utc>>,
) -> Option<ActionEvent> {
    let props = record.properties.as_ref()?;
    let email = prop(props, "email").filter(|e| !e.is_empty())?;

    let created = is_created(record.created_at, watermark);

    let mut bag = HashMap::new();
    let name = format!(
        "{} {}",
        prop(props, "firstname").unwrap_or_default(),
        prop(props, "lastname").unwrap_or_default()
    )
    .trim()
    .to_string();
    bag.insert("contact_name".to_string(), Value::from(name));
    if let Some(title) = prop(props, "jobtitle") {
        bag.insert("contact_title".to_string(), Value::from(title));
    }
    if let Some(source) = prop(props, "hs_analytics_source") {
        bag.insert("contact_source".to_string(), Value::from(source));
    }
    if let Some(status) = prop(props, "hs_lead_status") {
        bag.insert("contact_status".to_string(), Value::from(status));
    }
    let score = prop(props, "hubspotscore")
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(0);
    bag.insert("contact_score".to_string(), Value::from(score));

    Some(ActionEvent {
        action_name: if created {
            "Contact Created".to_string()
        } else {
            "Contact Updated".to_string()
        },
        action_date: if created {
            record.created_at
        } else {
            record.updated_at
        },
        include_in_analytics: 0,
        identity: Some(email),
        properties: bag,
    })
}

/// Transform one company record. Companies without a property bag are skipped.
pub fn transform_company(
    record: &RawRecord,
    watermark: Option<DateTime<Utc>>,
) -> Option<ActionEvent> {
    let props = record.properties.as_ref()?;

    let created = is_created(record.created_at, watermark);
    let base_date = if created {
        record.created_at
    } else {
        record.updated_at
    };

    let mut bag = HashMap::new();
    bag.insert("company_id".to_string(), Value::from(record.id.clone()));
    if let Some(domain) = prop(props, "domain") {
        bag.insert("company_domain".to_string(), Value::from(domain));
    }
    if let Some(industry) = prop(props, "industry") {
        bag.insert("company_industry".to_string(), Value::from(industry));
    }

    Some(ActionEvent {
        action_name: if created {
            "Company Created".to_string()
        } else {
            "Company Updated".to_string()
        },
        action_date: base_date - Duration::milliseconds(COMPANY_CLOCK_SKEW_MS),
        include_in_analytics: 0,
        identity: None,
        properties: bag,
    })
}

/// Transform one meeting record into one event per attendee. Meetings without
/// a property bag, or with no resolvable attendees, yield nothing.
pub fn transform_meeting(
    record: &RawRecord,
    watermark: Option<DateTime<Utc>>,
    attendees: &[String],
) -> Vec<ActionEvent> {
    let Some(props) = record.properties.as_ref() else {
        return Vec::new();
    };

    let created = is_created(record.created_at, watermark);

    let mut bag = HashMap::new();
    bag.insert("meeting_id".to_string(), Value::from(record.id.clone()));
    if let Some(title) = prop(props, "hs_meeting_title") {
        bag.insert("meeting_title".to_string(), Value::from(title));
    }
    if let Some(timestamp) = prop(props, "hs_timestamp") {
        bag.insert("meeting_timestamp".to_string(), Value::from(timestamp));
    }

    attendees
        .iter()
        .map(|email| ActionEvent {
            action_name: if created {
                "Meeting Created".to_string()
            } else {
                "Meeting Updated".to_string()
            },
            action_date: if created {
                record.created_at
            } else {
                record.updated_at
            },
            include_in_analytics: 0,
            identity: Some(email.clone()),
            properties: bag.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(
        id: &str,
        created: &str,
        updated: &str,
        props: Option<&[(&str, Option<&str>)]>,
    ) -> RawRecord {
        RawRecord {
            id: id.to_string(),
            created_at: created.parse().expect("created_at"),
            updated_at: updated.parse().expect("updated_at"),
            properties: props.map(|entries| {
                entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.map(|s| s.to_string())))
                    .collect()
            }),
        }
    }

    fn watermark() -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn contact_created_after_watermark() {
        let rec = record(
            "1",
            "2023-01-02T00:00:00Z",
            "2023-01-03T00:00:00Z",
            Some(&[
                ("email", Some("a@x.com")),
                ("firstname", Some("Ada")),
                ("lastname", Some("Lovelace")),
            ]),
        );

        let event = transform_contact(&rec, watermark()).expect("should emit");
        assert_eq!(event.action_name, "Contact Created");
        assert_eq!(event.identity.as_deref(), Some("a@x.com"));
        assert_eq!(event.action_date, rec.created_at);
        assert_eq!(event.include_in_analytics, 0);
        assert_eq!(event.properties["contact_name"], "Ada Lovelace");
        assert_eq!(event.properties["contact_score"], 0);
    }

    #[test]
    fn contact_updated_when_created_before_watermark() {
        let rec = record(
            "1",
            "2022-12-01T00:00:00Z",
            "2023-01-05T00:00:00Z",
            Some(&[("email", Some("a@x.com"))]),
        );

        let event = transform_contact(&rec, watermark()).expect("should emit");
        assert_eq!(event.action_name, "Contact Updated");
        assert_eq!(event.action_date, rec.updated_at);
    }

    #[test]
    fn contact_created_when_watermark_absent() {
        let rec = record(
            "1",
            "2022-01-01T00:00:00Z",
            "2022-01-02T00:00:00Z",
            Some(&[("email", Some("a@x.com"))]),
        );
        let event = transform_contact(&rec, None).expect("should emit");
        assert_eq!(event.action_name, "Contact Created");
    }

    #[test]
    fn contact_without_email_is_skipped() {
        let rec = record(
            "1",
            "2023-01-02T00:00:00Z",
            "2023-01-03T00:00:00Z",
            Some(&[("firstname", Some("Ada"))]),
        );
        assert!(transform_contact(&rec, watermark()).is_none());
    }

    #[test]
    fn contact_with_null_or_empty_email_is_skipped() {
        let null_email = record(
            "1",
            "2023-01-02T00:00:00Z",
            "2023-01-03T00:00:00Z",
            Some(&[("email", None)]),
        );
        assert!(transform_contact(&null_email, watermark()).is_none());

        let empty_email = record(
            "1",
            "2023-01-02T00:00:00Z",
            "2023-01-03T00:00:00Z",
            Some(&[("email", Some(""))]),
        );
        assert!(transform_contact(&empty_email, watermark()).is_none());
    }

    #[test]
    fn contact_without_properties_is_skipped() {
        let rec = record("1", "2023-01-02T00:00:00Z", "2023-01-03T00:00:00Z", None);
        assert!(transform_contact(&rec, watermark()).is_none());
    }

    #[test]
    fn contact_null_values_are_dropped() {
        let rec = record(
            "1",
            "2023-01-02T00:00:00Z",
            "2023-01-03T00:00:00Z",
            Some(&[
                ("email", Some("a@x.com")),
                ("jobtitle", None),
                ("hs_lead_status", Some("OPEN")),
            ]),
        );

        let event = transform_contact(&rec, watermark()).expect("should emit");
        assert!(!event.properties.contains_key("contact_title"));
        assert_eq!(event.properties["contact_status"], "OPEN");
    }

    #[test]
    fn contact_score_parses_or_defaults() {
        let rec = record(
            "1",
            "2023-01-02T00:00:00Z",
            "2023-01-03T00:00:00Z",
            Some(&[("email", Some("a@x.com")), ("hubspotscore", Some("87"))]),
        );
        let event = transform_contact(&rec, watermark()).expect("should emit");
        assert_eq!(event.properties["contact_score"], 87);

        let rec = record(
            "1",
            "2023-01-02T00:00:00Z",
            "2023-01-03T00:00:00Z",
            Some(&[("email", Some("a@x.com")), ("hubspotscore", Some("n/a"))]),
        );
        let event = transform_contact(&rec, watermark()).expect("should emit");
        assert_eq!(event.properties["contact_score"], 0);
    }

    #[test]
    fn company_action_date_is_pulled_back() {
        let rec = record(
            "c-9",
            "2023-01-02T00:00:00Z",
            "2023-01-03T00:00:00Z",
            Some(&[("domain", Some("x.com")), ("industry", Some("SaaS"))]),
        );

        let event = transform_company(&rec, watermark()).expect("should emit");
        assert_eq!(event.action_name, "Company Created");
        assert_eq!(
            event.action_date,
            rec.created_at - Duration::milliseconds(2000)
        );
        assert_eq!(event.identity, None);
        assert_eq!(event.properties["company_id"], "c-9");
        assert_eq!(event.properties["company_domain"], "x.com");
        assert_eq!(event.properties["company_industry"], "SaaS");
    }

    #[test]
    fn company_without_properties_is_skipped() {
        let rec = record("c-9", "2023-01-02T00:00:00Z", "2023-01-03T00:00:00Z", None);
        assert!(transform_company(&rec, watermark()).is_none());
    }

    #[test]
    fn company_updated_uses_updated_at() {
        let rec = record(
            "c-9",
            "2022-06-01T00:00:00Z",
            "2023-01-05T00:00:00Z",
            Some(&[("domain", Some("x.com"))]),
        );
        let event = transform_company(&rec, watermark()).expect("should emit");
        assert_eq!(event.action_name, "Company Updated");
        assert_eq!(
            event.action_date,
            rec.updated_at - Duration::milliseconds(2000)
        );
    }

    #[test]
    fn meeting_emits_one_event_per_attendee() {
        let rec = record(
            "m-1",
            "2023-01-02T00:00:00Z",
            "2023-01-03T00:00:00Z",
            Some(&[
                ("hs_meeting_title", Some("Kickoff")),
                ("hs_timestamp", Some("1672648800000")),
            ]),
        );

        let attendees = vec!["a@x.com".to_string(), "b@x.com".to_string()];
        let events = transform_meeting(&rec, watermark(), &attendees);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].action_name, "Meeting Created");
        assert_eq!(events[0].identity.as_deref(), Some("a@x.com"));
        assert_eq!(events[1].identity.as_deref(), Some("b@x.com"));
        assert_eq!(events[0].properties["meeting_id"], "m-1");
        assert_eq!(events[0].properties["meeting_title"], "Kickoff");
    }

    #[test]
    fn meeting_with_no_attendees_emits_nothing() {
        let rec = record(
            "m-1",
            "2023-01-02T00:00:00Z",
            "2023-01-03T00:00:00Z",
            Some(&[("hs_meeting_title", Some("Kickoff"))]),
        );
        assert!(transform_meeting(&rec, watermark(), &[]).is_empty());
    }

    #[test]
    fn meeting_without_properties_is_skipped() {
        let rec = record("m-1", "2023-01-02T00:00:00Z", "2023-01-03T00:00:00Z", None);
        let attendees = vec!["a@x.com".to_string()];
        assert!(transform_meeting(&rec, watermark(), &attendees).is_empty());
    }

    #[test]
    fn action_event_serializes_camel_case() {
        let rec = record(
            "1",
            "2023-01-02T00:00:00Z",
            "2023-01-03T00:00:00Z",
            Some(&[("email", Some("a@x.com"))]),
        );
        let event = transform_contact(&rec, watermark()).expect("should emit");

        let json = serde_json::to_value(&event).expect("should serialize");
        assert_eq!(json["actionName"], "Contact Created");
        assert_eq!(json["includeInAnalytics"], 0);
        assert_eq!(json["identity"], "a@x.com");
        assert!(json["actionDate"].is_string());
    }

    #[test]
    fn descriptors_parameterize_filter_property() {
        assert_eq!(ENTITIES[0].last_modified_property, "lastmodifieddate");
        assert_eq!(ENTITIES[1].last_modified_property, "hs_lastmodifieddate");
        assert_eq!(ENTITIES[2].last_modified_property, "hs_lastmodifieddate");
        assert_eq!(ENTITIES.map(|e| e.name), ["contacts", "companies", "meetings"]);
    }
}
