use std::collections::HashMap;

use anyhow::Context;
use serde_json::{Map, Value};

use crate::time_units::PartialTimeUnits;

/// Body of `POST /add`.
#[derive(Debug, PartialEq)]
pub struct AddRequest {
    pub key: String,
    pub content: String,
    pub time_to_wait: PartialTimeUnits,
}

/// Body of `PUT /update`.
#[derive(Debug, PartialEq)]
pub struct UpdateRequest {
    pub key: String,
    pub content: String,
    pub time_to_wait: PartialTimeUnits,
    pub release_date: Option<u64>,
}

/// Body of the requests that only name an entry: unblock and block. Sent
/// either as JSON or as an urlencoded form.
#[derive(Debug, PartialEq)]
pub struct KeyRequest {
    pub key: String,
}

/// Query of `GET /getContent`. An empty key is a valid lookup that simply
/// finds nothing.
#[derive(Debug, PartialEq)]
pub struct ContentQuery {
    pub key: String,
}

/// Query of `GET /getInfo`.
#[derive(Debug, PartialEq)]
pub struct InfoQuery {
    pub key: String,
    pub content: String,
}

impl AddRequest {
    pub fn deserialize(data: &[u8]) -> anyhow::Result<Self> {
        let object = parse_object(data)?;
        Ok(AddRequest {
            key: key_field(&object)?,
            content: string_field(&object, "content")?,
            time_to_wait: time_to_wait_field(&object)?,
        })
    }
}

impl UpdateRequest {
    pub fn deserialize(data: &[u8]) -> anyhow::Result<Self> {
        let object = parse_object(data)?;
        let release_date = match object.get("releaseDate") {
            None | Some(Value::Null) => None,
            Some(value) => Some(value.as_u64().ok_or_else(|| {
                anyhow::format_err!("\"releaseDate\" must be a non-negative integer")
            })?),
        };
        Ok(UpdateRequest {
            key: key_field(&object)?,
            content: string_field(&object, "content")?,
            time_to_wait: time_to_wait_field(&object)?,
            release_date,
        })
    }
}

impl KeyRequest {
    pub fn deserialize(data: &[u8]) -> anyhow::Result<Self> {
        let object = parse_object(data)?;
        Ok(KeyRequest {
            key: key_field(&object)?,
        })
    }

    pub fn from_form(data: &[u8]) -> anyhow::Result<Self> {
        let params: HashMap<String, String> =
            serde_urlencoded::from_bytes(data).context("body is not valid form data")?;
        Ok(KeyRequest {
            key: required_param(&params, "key")?,
        })
    }
}

impl ContentQuery {
    pub fn from_params(params: &HashMap<String, String>) -> anyhow::Result<Self> {
        Ok(ContentQuery {
            key: present_param(params, "key")?,
        })
    }
}

impl InfoQuery {
    pub fn from_params(params: &HashMap<String, String>) -> anyhow::Result<Self> {
        Ok(InfoQuery {
            key: required_param(params, "key")?,
            content: required_param(params, "content")?,
        })
    }
}

fn parse_object(data: &[u8]) -> anyhow::Result<Map<String, Value>> {
    match serde_json::from_slice(data) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => Err(anyhow::format_err!("body must be a JSON object")),
        Err(_) => Err(anyhow::format_err!("body is not valid JSON")),
    }
}

fn string_field(object: &Map<String, Value>, name: &str) -> anyhow::Result<String> {
    match object.get(name) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(anyhow::format_err!("{name:?} must be a string")),
        None => Err(anyhow::format_err!("missing {name:?}")),
    }
}

fn key_field(object: &Map<String, Value>) -> anyhow::Result<String> {
    let key = string_field(object, "key")?;
    if key.is_empty() {
        anyhow::bail!("\"key\" must not be empty");
    }
    Ok(key)
}

fn time_to_wait_field(object: &Map<String, Value>) -> anyhow::Result<PartialTimeUnits> {
    let value = match object.get("timeToWait") {
        Some(value @ Value::Object(_)) => value.clone(),
        Some(_) => anyhow::bail!("\"timeToWait\" must be an object"),
        None => anyhow::bail!("missing \"timeToWait\""),
    };
    let units: PartialTimeUnits = serde_json::from_value(value).map_err(|_| {
        anyhow::format_err!("\"timeToWait\" units must be non-negative integers")
    })?;
    if units.is_empty() {
        anyhow::bail!("\"timeToWait\" needs at least one of days, hours, minutes or seconds");
    }
    Ok(units)
}

fn present_param(params: &HashMap<String, String>, name: &str) -> anyhow::Result<String> {
    params
        .get(name)
        .cloned()
        .ok_or_else(|| anyhow::format_err!("missing {name:?} param of type string"))
}

fn required_param(params: &HashMap<String, String>, name: &str) -> anyhow::Result<String> {
    let value = present_param(params, name)?;
    if value.is_empty() {
        anyhow::bail!("{name:?} must not be empty");
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{AddRequest, ContentQuery, InfoQuery, KeyRequest, UpdateRequest};
    use crate::time_units::PartialTimeUnits;

    #[test]
    fn add_request() {
        let request = AddRequest::deserialize(
            br#"{"key":"k","content":"c","timeToWait":{"hours":2},"extra":true}"#,
        )
        .unwrap();
        assert_eq!(
            request,
            AddRequest {
                key: "k".to_string(),
                content: "c".to_string(),
                time_to_wait: PartialTimeUnits {
                    hours: Some(2),
                    ..Default::default()
                },
            }
        );
    }

    #[test]
    fn add_request_missing_fields() {
        let ttw = r#""timeToWait":{"days":0,"hours":0,"minutes":0,"seconds":0}"#;
        for body in [
            format!(r#"{{"content":"c",{ttw}}}"#),
            format!(r#"{{"key":"k",{ttw}}}"#),
            r#"{"key":"k","content":"c"}"#.to_string(),
        ] {
            assert!(AddRequest::deserialize(body.as_bytes()).is_err(), "{body}");
        }
    }

    #[test]
    fn add_request_bad_shapes() {
        let bodies: [&[u8]; 9] = [
            b"",
            b"[]",
            b"not json",
            br#"{"key":"","content":"c","timeToWait":{"days":1}}"#,
            br#"{"key":1,"content":"c","timeToWait":{"days":1}}"#,
            br#"{"key":"k","content":"c","timeToWait":{}}"#,
            br#"{"key":"k","content":"c","timeToWait":5}"#,
            br#"{"key":"k","content":"c","timeToWait":{"days":-1}}"#,
            br#"{"key":"k","content":"c","timeToWait":{"days":1.5}}"#,
        ];
        for body in bodies {
            assert!(AddRequest::deserialize(body).is_err());
        }
    }

    #[test]
    fn update_request_release_date() {
        let request = UpdateRequest::deserialize(
            br#"{"key":"k","content":"c","timeToWait":{"seconds":1},"releaseDate":1234}"#,
        )
        .unwrap();
        assert_eq!(request.release_date, Some(1234));

        let request = UpdateRequest::deserialize(
            br#"{"key":"k","content":"c","timeToWait":{"seconds":1},"releaseDate":null}"#,
        )
        .unwrap();
        assert_eq!(request.release_date, None);

        assert!(UpdateRequest::deserialize(
            br#"{"key":"k","content":"c","timeToWait":{"seconds":1},"releaseDate":"soon"}"#,
        )
        .is_err());
    }

    #[test]
    fn key_request_ignores_extra_fields() {
        let request = KeyRequest::deserialize(br#"{"key":"k","whatever":""}"#).unwrap();
        assert_eq!(request.key, "k");
        assert!(KeyRequest::deserialize(br#"{"whatever":""}"#).is_err());
    }

    #[test]
    fn key_request_from_form() {
        let request = KeyRequest::from_form(b"key=my+key%21&whatever=1").unwrap();
        assert_eq!(request.key, "my key!");
        assert!(KeyRequest::from_form(b"key=").is_err());
        assert!(KeyRequest::from_form(b"whatever=1").is_err());
        assert!(KeyRequest::from_form(b"").is_err());
    }

    #[test]
    fn queries() {
        let mut params = HashMap::new();
        assert!(ContentQuery::from_params(&params).is_err());
        params.insert("key".to_string(), String::new());
        assert_eq!(ContentQuery::from_params(&params).unwrap().key, "");
        assert!(InfoQuery::from_params(&params).is_err());
        params.insert("key".to_string(), "k".to_string());
        assert_eq!(ContentQuery::from_params(&params).unwrap().key, "k");
        assert!(InfoQuery::from_params(&params).is_err());
        params.insert("content".to_string(), String::new());
        assert!(InfoQuery::from_params(&params).is_err());
        params.insert("content".to_string(), "c".to_string());
        assert_eq!(
            InfoQuery::from_params(&params).unwrap(),
            InfoQuery {
                key: "k".to_string(),
                content: "c".to_string(),
            }
        );
    }
}
