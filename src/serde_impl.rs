use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::DecodedSid;

impl Serialize for DecodedSid {
    #[inline]
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            serializer.serialize_bytes(&self.to_binary())
        }
    }
}

struct DecodedSidVisitor;

impl<'de> de::Visitor<'de> for DecodedSidVisitor {
    type Value = DecodedSid;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a SID as a string (e.g., \"S-1-5-...\") or as raw binary")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        v.parse()
            .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }

    fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        DecodedSid::decode(v).map_err(|_| E::invalid_value(de::Unexpected::Bytes(v), &self))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: de::SeqAccess<'de>,
    {
        let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(byte) = seq.next_element::<u8>()? {
            bytes.push(byte);
        }
        self.visit_bytes(&bytes)
    }
}

impl<'de> Deserialize<'de> for DecodedSid {
    #[inline]
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            deserializer.deserialize_str(DecodedSidVisitor)
        } else {
            deserializer.deserialize_bytes(DecodedSidVisitor)
        }
    }
}

#[allow(clippy::unwrap_used, reason = "Unwrap is not an issue in test")]
#[cfg(test)]
mod test {
    use crate::DecodedSid;
    use serde_test::{self, Configure, Token};

    const BYTES: &[u8] = &[1, 3, 0, 0, 0, 0, 0, 5, 5, 0, 0, 0, 32, 0, 0, 0, 32, 2, 0, 0];

    fn sid() -> DecodedSid {
        DecodedSid {
            revision: 1,
            authority: 5,
            sub_authorities: vec![5, 32, 544],
        }
    }

    #[test]
    fn test_binary() {
        serde_test::assert_tokens(&sid().compact(), &[Token::Bytes(BYTES)]);
    }

    #[test]
    fn test_human() {
        serde_test::assert_tokens(&sid().readable(), &[Token::Str("S-1-5-5-32-544")]);
    }

    #[test]
    fn test_json_string() {
        let sid: DecodedSid = serde_json::from_str("\"S-1-5-5-32-544\"").unwrap();
        assert_eq!(sid, self::sid());
        assert_eq!(serde_json::to_string(&sid).unwrap(), "\"S-1-5-5-32-544\"");
    }

    #[test]
    fn test_invalid_string() {
        serde_test::assert_de_tokens_error::<serde_test::Readable<DecodedSid>>(
            &[Token::Str("S-1")],
            "invalid value: string \"S-1\", \
             expected a SID as a string (e.g., \"S-1-5-...\") or as raw binary",
        );
    }
}
