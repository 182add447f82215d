// src/common/coerce.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;

// Política de coerção numérica dos formulários:
// o frontend manda "" quando o campo fica em branco, null quando limpa,
// string numérica quando digita. Tudo que não for número vira NULL no
// banco — nunca 0, nunca NaN.

/// Normaliza um valor JSON arbitrário para `Option<Decimal>`.
pub fn coerce_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Null => None,
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Decimal::from_str(trimmed).ok()
            }
        }
        _ => None,
    }
}

/// `deserialize_with` para campos monetários dos payloads.
/// Use junto com `#[serde(default)]`: campo ausente também vira None.
pub fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_decimal(&value))
}

/// Captura o valor JSON cru preservando a presença do campo: null
/// chega como `Some(Value::Null)`, não como `None`. Use com
/// `#[serde(default)]` para o ausente virar `None`.
pub fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Some(Value::deserialize(deserializer)?))
}

/// Distingue "campo ausente" de "campo null" num payload de update:
/// ausente = não mexe; null = limpa. Use com `#[serde(default)]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Ok(Some(Option::<T>::deserialize(deserializer)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_vazia_e_null_viram_none() {
        assert_eq!(coerce_decimal(&json!("")), None);
        assert_eq!(coerce_decimal(&json!("   ")), None);
        assert_eq!(coerce_decimal(&json!(null)), None);
    }

    #[test]
    fn lixo_vira_none_nunca_zero() {
        assert_eq!(coerce_decimal(&json!("abc")), None);
        assert_eq!(coerce_decimal(&json!("12,5x")), None);
        assert_eq!(coerce_decimal(&json!({"valor": 1})), None);
        assert_eq!(coerce_decimal(&json!([1, 2])), None);
    }

    #[test]
    fn numeros_e_strings_numericas_passam() {
        assert_eq!(coerce_decimal(&json!("250000")), Decimal::from_str("250000").ok());
        assert_eq!(coerce_decimal(&json!(250000)), Decimal::from_str("250000").ok());
        assert_eq!(coerce_decimal(&json!("3.125")), Decimal::from_str("3.125").ok());
        assert_eq!(coerce_decimal(&json!(-1.5)), Decimal::from_str("-1.5").ok());
    }

    #[test]
    fn campo_ausente_no_payload_vira_none() {
        #[derive(serde::Deserialize)]
        struct Payload {
            #[serde(default, deserialize_with = "lenient_decimal")]
            purchase_price: Option<Decimal>,
        }

        let p: Payload = serde_json::from_str("{}").unwrap();
        assert_eq!(p.purchase_price, None);

        let p: Payload = serde_json::from_str(r#"{"purchase_price": ""}"#).unwrap();
        assert_eq!(p.purchase_price, None);

        let p: Payload = serde_json::from_str(r#"{"purchase_price": "99.90"}"#).unwrap();
        assert_eq!(p.purchase_price, Decimal::from_str("99.90").ok());
    }
}
