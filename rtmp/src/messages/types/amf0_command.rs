use crate::messages::MessageSerializationError;
use bytes::Bytes;
use relay_amf0::Amf0Value;

pub fn serialize(
    command_name: &str,
    transaction_id: f64,
    command_object: Amf0Value,
    mut additional_arguments: Vec<Amf0Value>,
) -> Result<Bytes, MessageSerializationError> {
    let mut values = vec![
        Amf0Value::Utf8String(command_name.to_string()),
        Amf0Value::Number(transaction_id),
        command_object,
    ];

    values.append(&mut additional_arguments);
    let bytes = relay_amf0::serialize(&values)?;

    Ok(Bytes::from(bytes))
}

#[cfg(test)]
mod tests {
    use super::serialize;
    use relay_amf0::{Amf0Object, Amf0Value};
    use std::io::Cursor;

    #[test]
    fn can_serialize_command_sequence() {
        let mut properties = Amf0Object::new();
        properties.insert("prop1", Amf0Value::Utf8String("abc".to_string()));
        properties.insert("prop2", Amf0Value::Null);

        let raw_payload = serialize(
            "test",
            23.0,
            Amf0Value::Object(properties.clone()),
            vec![Amf0Value::Boolean(true), Amf0Value::Number(52.0)],
        )
        .unwrap();

        let mut cursor = Cursor::new(raw_payload);
        let result = relay_amf0::deserialize(&mut cursor).unwrap();

        let expected = vec![
            Amf0Value::Utf8String("test".to_string()),
            Amf0Value::Number(23.0),
            Amf0Value::Object(properties),
            Amf0Value::Boolean(true),
            Amf0Value::Number(52.0),
        ];

        assert_eq!(result, expected);
    }
}
