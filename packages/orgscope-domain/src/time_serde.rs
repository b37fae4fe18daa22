use serde::{Deserialize, Deserializer, Serializer};
use time::{
	OffsetDateTime, PrimitiveDateTime, format_description::well_known::Rfc3339, macros::format_description,
};

pub fn serialize<S>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	let formatted = value.format(&Rfc3339).map_err(serde::ser::Error::custom)?;

	serializer.serialize_str(&formatted)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = String::deserialize(deserializer)?;

	parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

/// Parses RFC 3339, falling back to offset-less timestamps which are taken as UTC.
///
/// The chat backend emits `2024-06-01T12:30:00.123456` style values without an offset.
pub fn parse_timestamp(raw: &str) -> Result<OffsetDateTime, time::error::Parse> {
	let raw = raw.trim();

	match OffsetDateTime::parse(raw, &Rfc3339) {
		Ok(value) => Ok(value),
		Err(err) => {
			let naive_t = format_description!(
				"[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
			);
			let naive_space = format_description!(
				"[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]]"
			);

			PrimitiveDateTime::parse(raw, naive_t)
				.or_else(|_| PrimitiveDateTime::parse(raw, naive_space))
				.map(PrimitiveDateTime::assume_utc)
				.map_err(|_| err)
		},
	}
}
