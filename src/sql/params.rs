//! Convert validated field values to types that sqlx can bind.

use crate::service::Coerced;
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::{PgTypeInfo, Postgres};
use sqlx::{Database, Type};

/// A value that can be bound to a PostgreSQL query.
///
/// Integers, booleans and dates are sent with their native type. Identifiers are sent as
/// canonical text and cast in SQL (`$n::uuid`), so the cast is visible in the statement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PgBindValue {
    Null,
    Bool(bool),
    I64(i64),
    Date(NaiveDate),
    String(String),
    Uuid(uuid::Uuid),
}

impl From<Coerced> for PgBindValue {
    fn from(v: Coerced) -> Self {
        match v {
            Coerced::Absent => PgBindValue::Null,
            Coerced::Text(s) => PgBindValue::String(s),
            Coerced::Integer(n) => PgBindValue::I64(n),
            Coerced::Boolean(b) => PgBindValue::Bool(b),
            Coerced::Date(d) => PgBindValue::Date(d),
            Coerced::Uuid(u) => PgBindValue::Uuid(u),
        }
    }
}

impl<'q> Encode<'q, Postgres> for PgBindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        Ok(match self {
            PgBindValue::Null => <Option<&str> as Encode<Postgres>>::encode_by_ref(&None, buf)?,
            PgBindValue::Bool(b) => <bool as Encode<Postgres>>::encode_by_ref(b, buf)?,
            PgBindValue::I64(n) => <i64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            PgBindValue::Date(d) => <NaiveDate as Encode<Postgres>>::encode_by_ref(d, buf)?,
            PgBindValue::String(s) => {
                let s_ref: &str = s.as_str();
                <&str as Encode<Postgres>>::encode_by_ref(&s_ref, buf)?
            }
            PgBindValue::Uuid(u) => {
                let u_str = u.to_string();
                <&str as Encode<Postgres>>::encode_by_ref(&u_str.as_str(), buf)?
            }
        })
    }

    fn produces(&self) -> Option<PgTypeInfo> {
        match self {
            PgBindValue::Bool(_) => Some(<bool as Type<Postgres>>::type_info()),
            PgBindValue::I64(_) => Some(<i64 as Type<Postgres>>::type_info()),
            PgBindValue::Date(_) => Some(<NaiveDate as Type<Postgres>>::type_info()),
            PgBindValue::Null | PgBindValue::String(_) | PgBindValue::Uuid(_) => None,
        }
    }
}

impl Type<Postgres> for PgBindValue {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("TEXT")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_becomes_null() {
        assert_eq!(PgBindValue::from(Coerced::Absent), PgBindValue::Null);
    }

    #[test]
    fn native_types_are_declared() {
        assert_eq!(
            PgBindValue::I64(3).produces(),
            Some(<i64 as Type<Postgres>>::type_info())
        );
        assert!(PgBindValue::String("x".into()).produces().is_none());
        assert!(PgBindValue::Uuid(uuid::Uuid::nil()).produces().is_none());
    }

    #[test]
    fn serializes_as_plain_json() {
        let v = serde_json::to_value(vec![
            PgBindValue::Null,
            PgBindValue::I64(3),
            PgBindValue::Date(NaiveDate::from_ymd_opt(1799, 6, 6).unwrap()),
        ])
        .unwrap();
        assert_eq!(v, serde_json::json!([null, 3, "1799-06-06"]));
    }
}
