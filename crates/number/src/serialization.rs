use {
    primitive_types::U256,
    serde::{Deserialize, Deserializer, Serializer, de},
    serde_with::{DeserializeAs, SerializeAs},
};

/// Serialize and deserialize a [`U256`] as a decimal string, also accepting
/// `0x` prefixed hex strings and plain integers on input.
#[derive(Debug)]
pub struct HexOrDecimalU256;

impl<'de> DeserializeAs<'de, U256> for HexOrDecimalU256 {
    fn deserialize_as<D>(deserializer: D) -> Result<U256, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize(deserializer)
    }
}

impl SerializeAs<U256> for HexOrDecimalU256 {
    fn serialize_as<S>(source: &U256, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serialize(source, serializer)
    }
}

pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_string())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Integer(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Integer(value) => Ok(U256::from(value)),
        Raw::Text(text) => parse(&text).map_err(de::Error::custom),
    }
}

/// Parses a decimal or `0x` prefixed hex string. Underscores are accepted as
/// digit separators.
pub fn parse(text: &str) -> Result<U256, String> {
    let cleaned = text.trim().replace('_', "");
    match cleaned.strip_prefix("0x") {
        Some(hex) => U256::from_str_radix(hex, 16).map_err(|err| format!("{err:?}")),
        None => U256::from_dec_str(&cleaned).map_err(|err| format!("{err:?}")),
    }
    .map_err(|err| format!("failed to parse {text:?} as U256: {err}"))
}
