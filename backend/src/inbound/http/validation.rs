//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every helper turns malformed input into an `invalid_request` error whose
//! `details` name the offending field and a stable machine-readable code.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use pagination::Cursor;
use serde::{Deserialize, Deserializer};
use serde_json::json;

use crate::domain::{
    Error, ListingCursor, ListingId, ListingQueryError, ListingSort, NewImage, NumericRange,
    SortDirection, SortField,
};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidUuid,
    InvalidRange,
    InvalidSort,
    InvalidCursor,
    InvalidBase64,
    MissingContentType,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidRange => "invalid_range",
            ErrorCode::InvalidSort => "invalid_sort",
            ErrorCode::InvalidCursor => "invalid_cursor",
            ErrorCode::InvalidBase64 => "invalid_base64",
            ErrorCode::MissingContentType => "missing_content_type",
        }
    }
}

/// Newtype wrapper for HTTP field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(self) -> &'static str {
        self.0
    }
}

fn field_error(field: FieldName, code: ErrorCode, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": code.as_str(),
    }))
}

fn value_error(
    field: FieldName,
    code: ErrorCode,
    message: impl Into<String>,
    value: &str,
) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "value": value,
        "code": code.as_str(),
    }))
}

pub(crate) fn parse_listing_id(value: &str, field: FieldName) -> Result<ListingId, Error> {
    value.parse::<ListingId>().map_err(|_| {
        value_error(
            field,
            ErrorCode::InvalidUuid,
            format!("{} must be a valid UUID", field.as_str()),
            value,
        )
    })
}

/// Split a comma-separated inclusion list, dropping blank entries.
///
/// `brand=BMW,Audi` and repeated blank separators both work; an absent
/// parameter yields an empty list, which matches everything.
pub(crate) fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn parse_range(
    value: Option<&str>,
    field: FieldName,
) -> Result<Option<NumericRange>, Error> {
    value
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| {
            raw.parse::<NumericRange>()
                .map_err(|err| value_error(field, ErrorCode::InvalidRange, err.to_string(), raw))
        })
        .transpose()
}

pub(crate) fn parse_sort(
    field: Option<&str>,
    direction: Option<&str>,
) -> Result<ListingSort, Error> {
    let mut sort = ListingSort::default();
    if let Some(raw) = field {
        sort.field = raw.parse::<SortField>().map_err(|err| sort_error("sort", &err, raw))?;
    }
    if let Some(raw) = direction {
        sort.direction = raw
            .parse::<SortDirection>()
            .map_err(|err| sort_error("order", &err, raw))?;
    }
    Ok(sort)
}

fn sort_error(field: &'static str, err: &ListingQueryError, raw: &str) -> Error {
    value_error(FieldName::new(field), ErrorCode::InvalidSort, err.to_string(), raw)
}

pub(crate) fn parse_cursor(value: Option<&str>) -> Result<Option<ListingCursor>, Error> {
    value
        .filter(|raw| !raw.is_empty())
        .map(|raw| {
            Cursor::<ListingCursor>::decode(raw)
                .map(Cursor::into_inner)
                .map_err(|err| {
                    field_error(FieldName::new("cursor"), ErrorCode::InvalidCursor, err.to_string())
                })
        })
        .transpose()
}

/// Serde helper telling an absent field (`None`) from an explicit `null`
/// (`Some(None)`). Pair with `#[serde(default)]`.
pub(crate) fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Encode a keyset position as an opaque token.
pub(crate) fn encode_cursor(cursor: ListingCursor) -> Result<String, Error> {
    Cursor::new(cursor)
        .encode()
        .map_err(|err| Error::internal(format!("failed to encode cursor: {err}")))
}

/// Decode an inline image upload.
///
/// Accepts either raw base64 with a separate content type or a
/// `data:<type>;base64,<payload>` URL.
pub(crate) fn decode_image(
    index: usize,
    content_type: Option<&str>,
    data: &str,
) -> Result<NewImage, Error> {
    let field = FieldName::new("images");
    let (declared, payload) = match data.strip_prefix("data:") {
        Some(rest) => match rest.split_once(";base64,") {
            Some((media_type, payload)) => (Some(media_type), payload),
            None => {
                return Err(indexed_error(
                    field,
                    ErrorCode::InvalidBase64,
                    format!("image {index} data URL must be base64 encoded"),
                    index,
                ));
            }
        },
        None => (None, data),
    };
    let content_type = content_type
        .or(declared)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            indexed_error(
                field,
                ErrorCode::MissingContentType,
                format!("image {index} needs a content type"),
                index,
            )
        })?;
    let bytes = STANDARD.decode(payload.trim()).map_err(|_| {
        indexed_error(
            field,
            ErrorCode::InvalidBase64,
            format!("image {index} is not valid base64"),
            index,
        )
    })?;
    Ok(NewImage {
        content_type: content_type.to_ascii_lowercase(),
        bytes,
    })
}

fn indexed_error(
    field: FieldName,
    code: ErrorCode,
    message: impl Into<String>,
    index: usize,
) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "index": index,
        "code": code.as_str(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode as DomainCode;
    use rstest::rstest;

    fn detail_code(error: &Error) -> Option<&str> {
        error
            .details()
            .and_then(|details| details.get("code"))
            .and_then(|code| code.as_str())
    }

    #[rstest]
    fn listing_ids_must_be_uuids() {
        let err = parse_listing_id("car-42", FieldName::new("id")).expect_err("invalid");
        assert_eq!(err.code(), DomainCode::InvalidRequest);
        assert_eq!(detail_code(&err), Some("invalid_uuid"));
    }

    #[rstest]
    #[case(None, vec![])]
    #[case(Some(""), vec![])]
    #[case(Some("BMW"), vec!["BMW"])]
    #[case(Some("BMW, Audi,,"), vec!["BMW", "Audi"])]
    fn lists_split_on_commas(#[case] raw: Option<&str>, #[case] expected: Vec<&str>) {
        assert_eq!(split_list(raw), expected);
    }

    #[rstest]
    #[case("100-50")]
    #[case("cheap")]
    fn bad_ranges_name_their_field(#[case] raw: &str) {
        let err = parse_range(Some(raw), FieldName::new("price")).expect_err("invalid");
        let details = err.details().expect("details");
        assert_eq!(details["field"], "price");
        assert_eq!(details["code"], "invalid_range");
    }

    #[rstest]
    fn blank_ranges_are_ignored() {
        assert_eq!(parse_range(Some(" "), FieldName::new("year")).expect("ok"), None);
    }

    #[rstest]
    fn sort_defaults_to_newest_first() {
        assert_eq!(parse_sort(None, None).expect("ok"), ListingSort::default());
    }

    #[rstest]
    fn unknown_sort_direction_is_rejected() {
        let err = parse_sort(Some("price"), Some("sideways")).expect_err("invalid");
        assert_eq!(err.details().expect("details")["field"], "order");
    }

    #[rstest]
    fn cursors_survive_encoding() {
        let cursor = ListingCursor {
            sort: ListingSort::default(),
            value: 1_700_000_000_000_000,
            id: uuid::Uuid::nil(),
        };
        let token = encode_cursor(cursor).expect("encode");
        assert_eq!(parse_cursor(Some(&token)).expect("decode"), Some(cursor));
    }

    #[rstest]
    fn garbage_cursors_are_invalid_requests() {
        let err = parse_cursor(Some("!!not-a-cursor!!")).expect_err("invalid");
        assert_eq!(detail_code(&err), Some("invalid_cursor"));
    }

    #[rstest]
    fn data_urls_carry_their_content_type() {
        let image = decode_image(0, None, "data:image/PNG;base64,AQID").expect("decoded");
        assert_eq!(image.content_type, "image/png");
        assert_eq!(image.bytes, vec![1, 2, 3]);
    }

    #[rstest]
    fn explicit_content_type_wins() {
        let image = decode_image(0, Some("image/webp"), "AQID").expect("decoded");
        assert_eq!(image.content_type, "image/webp");
    }

    #[rstest]
    #[case::no_type(None, "AQID", "missing_content_type")]
    #[case::bad_base64(Some("image/jpeg"), "***", "invalid_base64")]
    #[case::not_base64_url(None, "data:image/jpeg,raw", "invalid_base64")]
    fn broken_images_are_rejected(
        #[case] content_type: Option<&str>,
        #[case] data: &str,
        #[case] code: &str,
    ) {
        let err = decode_image(3, content_type, data).expect_err("invalid");
        let details = err.details().expect("details");
        assert_eq!(details["index"], 3);
        assert_eq!(details["code"], code);
    }
}
