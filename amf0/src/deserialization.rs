//! This module contains functionality to deserialize values from bytes
//! that were encoded via the AMF0 specification
//! (http://wwwimages.adobe.com/content/dam/Adobe/en/devnet/amf/pdf/amf0-file-format-specification.pdf)

use crate::errors::Amf0DeserializationError;
use crate::markers;
use crate::{Amf0Object, Amf0Value};
use byteorder::{BigEndian, ReadBytesExt};
use std::io::Read;

struct ObjectProperty {
    label: String,
    value: Amf0Value,
}

/// Turns any readable byte stream and converts it into an array of AMF0 values
pub fn deserialize<R: Read>(bytes: &mut R) -> Result<Vec<Amf0Value>, Amf0DeserializationError> {
    let mut results = vec![];

    loop {
        match read_next_value(bytes)? {
            Some(x) => results.push(x),
            None => break,
        };
    }

    Ok(results)
}

fn read_next_value<R: Read>(bytes: &mut R) -> Result<Option<Amf0Value>, Amf0DeserializationError> {
    let mut buffer: [u8; 1] = [0];
    let bytes_read = bytes.read(&mut buffer)?;

    if bytes_read == 0 {
        return Ok(None);
    }

    match buffer[0] {
        markers::NUMBER_MARKER => parse_number(bytes).map(Some),
        markers::BOOLEAN_MARKER => parse_bool(bytes).map(Some),
        markers::STRING_MARKER => parse_string(bytes).map(Some),
        markers::OBJECT_MARKER => parse_object(bytes).map(Some),
        markers::NULL_MARKER => Ok(Some(Amf0Value::Null)),
        markers::UNDEFINED_MARKER => Ok(Some(Amf0Value::Undefined)),
        markers::REFERENCE_MARKER => parse_reference(bytes).map(Some),
        markers::ECMA_ARRAY_MARKER => parse_ecma_array(bytes).map(Some),
        markers::OBJECT_END_MARKER => {
            // Only legal as the terminator of an object's property list,
            // which parse_object_property consumes itself.
            Err(Amf0DeserializationError::UnexpectedObjectEndMarker)
        }
        markers::STRICT_ARRAY_MARKER => parse_strict_array(bytes).map(Some),
        markers::DATE_MARKER => parse_date(bytes).map(Some),
        markers::LONG_STRING_MARKER => parse_long_string(bytes).map(Some),
        _ => Err(Amf0DeserializationError::UnknownMarker { marker: buffer[0] }),
    }
}

fn parse_number<R: Read>(bytes: &mut R) -> Result<Amf0Value, Amf0DeserializationError> {
    let number = bytes.read_f64::<BigEndian>()?;
    Ok(Amf0Value::Number(number))
}

fn parse_bool<R: Read>(bytes: &mut R) -> Result<Amf0Value, Amf0DeserializationError> {
    let value = bytes.read_u8()?;
    Ok(Amf0Value::Boolean(value == 1))
}

fn parse_string<R: Read>(bytes: &mut R) -> Result<Amf0Value, Amf0DeserializationError> {
    let length = bytes.read_u16::<BigEndian>()?;
    let mut buffer = vec![0_u8; length as usize];
    bytes.read_exact(&mut buffer)?;

    let value = String::from_utf8(buffer)?;
    Ok(Amf0Value::Utf8String(value))
}

fn parse_long_string<R: Read>(bytes: &mut R) -> Result<Amf0Value, Amf0DeserializationError> {
    let length = bytes.read_u32::<BigEndian>()?;
    let mut buffer = vec![0_u8; length as usize];
    bytes.read_exact(&mut buffer)?;

    let value = String::from_utf8(buffer)?;
    Ok(Amf0Value::LongString(value))
}

fn parse_reference<R: Read>(bytes: &mut R) -> Result<Amf0Value, Amf0DeserializationError> {
    let index = bytes.read_u16::<BigEndian>()?;
    Ok(Amf0Value::Reference(index))
}

fn parse_date<R: Read>(bytes: &mut R) -> Result<Amf0Value, Amf0DeserializationError> {
    let unix_time_ms = bytes.read_f64::<BigEndian>()?;

    // The timezone offset is reserved and always zero in practice.
    let _timezone = bytes.read_i16::<BigEndian>()?;

    Ok(Amf0Value::Date { unix_time_ms })
}

fn parse_object<R: Read>(bytes: &mut R) -> Result<Amf0Value, Amf0DeserializationError> {
    Ok(Amf0Value::Object(parse_object_properties(bytes)?))
}

fn parse_ecma_array<R: Read>(bytes: &mut R) -> Result<Amf0Value, Amf0DeserializationError> {
    // The associative count is advisory.  Real encoders terminate the array
    // with the same empty-key + object-end sentinel objects use, so the
    // properties are read exactly as an object's would be.
    let _associative_count = bytes.read_u32::<BigEndian>()?;
    Ok(Amf0Value::EcmaArray(parse_object_properties(bytes)?))
}

fn parse_object_properties<R: Read>(
    bytes: &mut R,
) -> Result<Amf0Object, Amf0DeserializationError> {
    let mut properties = Amf0Object::new();

    loop {
        match parse_object_property(bytes)? {
            Some(property) => properties.insert(property.label, property.value),
            None => break,
        };
    }

    Ok(properties)
}

fn parse_strict_array<R: Read>(bytes: &mut R) -> Result<Amf0Value, Amf0DeserializationError> {
    let array_count = bytes.read_u32::<BigEndian>()?;
    let mut values: Vec<Amf0Value> = Vec::new();

    for _ in 0..array_count {
        match read_next_value(bytes)? {
            Some(value) => values.push(value),
            None => return Err(Amf0DeserializationError::UnexpectedEof),
        };
    }

    Ok(Amf0Value::StrictArray(values))
}

fn parse_object_property<R: Read>(
    bytes: &mut R,
) -> Result<Option<ObjectProperty>, Amf0DeserializationError> {
    let label_length = bytes.read_u16::<BigEndian>()?;
    if label_length == 0 {
        // Next byte should be the end of object marker.  We need to read this
        // to make sure we progress the current position.
        let byte = bytes.read_u8()?;
        if byte != markers::OBJECT_END_MARKER {
            return Err(Amf0DeserializationError::UnexpectedEmptyObjectPropertyName);
        }

        return Ok(None);
    }

    let mut label_buffer = vec![0; label_length as usize];
    bytes.read_exact(&mut label_buffer)?;

    let label = String::from_utf8(label_buffer)?;

    match read_next_value(bytes)? {
        None => Err(Amf0DeserializationError::UnexpectedEof),
        Some(property_value) => Ok(Some(ObjectProperty {
            label,
            value: property_value,
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::deserialize;
    use crate::errors::Amf0DeserializationError;
    use crate::markers;
    use crate::{Amf0Object, Amf0Value};
    use byteorder::{BigEndian, WriteBytesExt};
    use std::io::Cursor;

    #[test]
    fn can_deserialize_number() {
        let number: f64 = 332.0;

        let mut vector = vec![];
        vector.write_u8(markers::NUMBER_MARKER).unwrap();
        vector.write_f64::<BigEndian>(number).unwrap();

        let mut input = Cursor::new(vector);
        let result = deserialize(&mut input).unwrap();

        let expected = vec![Amf0Value::Number(number)];
        assert_eq!(result, expected);
    }

    #[test]
    fn can_deserialize_true_boolean() {
        let mut vector = vec![];
        vector.write_u8(markers::BOOLEAN_MARKER).unwrap();
        vector.write_u8(1).unwrap();

        let mut input = Cursor::new(vector);
        let result = deserialize(&mut input).unwrap();

        let expected = vec![Amf0Value::Boolean(true)];
        assert_eq!(result, expected);
    }

    #[test]
    fn can_deserialize_false_boolean() {
        let mut vector = vec![];
        vector.write_u8(markers::BOOLEAN_MARKER).unwrap();
        vector.write_u8(0).unwrap();

        let mut input = Cursor::new(vector);
        let result = deserialize(&mut input).unwrap();

        let expected = vec![Amf0Value::Boolean(false)];
        assert_eq!(result, expected);
    }

    #[test]
    fn can_deserialize_string() {
        let value = "test";

        let mut vector = vec![];
        vector.write_u8(markers::STRING_MARKER).unwrap();
        vector.write_u16::<BigEndian>(value.len() as u16).unwrap();
        vector.extend(value.as_bytes());

        let mut input = Cursor::new(vector);
        let result = deserialize(&mut input).unwrap();

        let expected = vec![Amf0Value::Utf8String(value.to_string())];
        assert_eq!(result, expected);
    }

    #[test]
    fn can_deserialize_long_string() {
        let value = "test";

        let mut vector = vec![];
        vector.write_u8(markers::LONG_STRING_MARKER).unwrap();
        vector.write_u32::<BigEndian>(value.len() as u32).unwrap();
        vector.extend(value.as_bytes());

        let mut input = Cursor::new(vector);
        let result = deserialize(&mut input).unwrap();

        let expected = vec![Amf0Value::LongString(value.to_string())];
        assert_eq!(result, expected);
    }

    #[test]
    fn can_deserialize_null() {
        let vector = vec![markers::NULL_MARKER];

        let mut input = Cursor::new(vector);
        let result = deserialize(&mut input).unwrap();

        let expected = vec![Amf0Value::Null];
        assert_eq!(result, expected);
    }

    #[test]
    fn can_deserialize_undefined() {
        let vector = vec![markers::UNDEFINED_MARKER];

        let mut input = Cursor::new(vector);
        let result = deserialize(&mut input).unwrap();

        let expected = vec![Amf0Value::Undefined];
        assert_eq!(result, expected);
    }

    #[test]
    fn can_deserialize_reference() {
        let mut vector = vec![];
        vector.write_u8(markers::REFERENCE_MARKER).unwrap();
        vector.write_u16::<BigEndian>(12).unwrap();

        let mut input = Cursor::new(vector);
        let result = deserialize(&mut input).unwrap();

        let expected = vec![Amf0Value::Reference(12)];
        assert_eq!(result, expected);
    }

    #[test]
    fn can_deserialize_date() {
        let mut vector = vec![];
        vector.write_u8(markers::DATE_MARKER).unwrap();
        vector.write_f64::<BigEndian>(1000.0).unwrap();
        vector.write_i16::<BigEndian>(0).unwrap();

        let mut input = Cursor::new(vector);
        let result = deserialize(&mut input).unwrap();

        let expected = vec![Amf0Value::Date {
            unix_time_ms: 1000.0,
        }];
        assert_eq!(result, expected);
    }

    #[test]
    fn can_deserialize_object() {
        const NUMBER: f64 = 332.0;

        let mut vector = vec![];
        vector.push(markers::OBJECT_MARKER);
        vector.write_u16::<BigEndian>(4).unwrap();
        vector.extend("test".as_bytes());
        vector.push(markers::NUMBER_MARKER);
        vector.write_f64::<BigEndian>(NUMBER).unwrap();
        vector
            .write_u16::<BigEndian>(markers::UTF_8_EMPTY_MARKER)
            .unwrap();
        vector.push(markers::OBJECT_END_MARKER);

        let mut input = Cursor::new(vector);
        let result = deserialize(&mut input).unwrap();

        let mut properties = Amf0Object::new();
        properties.insert("test", Amf0Value::Number(NUMBER));

        let expected = vec![Amf0Value::Object(properties)];
        assert_eq!(result, expected);
    }

    #[test]
    fn object_deserialization_preserves_key_order() {
        let mut vector = vec![];
        vector.push(markers::OBJECT_MARKER);
        for label in ["zulu", "alpha", "mike"] {
            vector.write_u16::<BigEndian>(label.len() as u16).unwrap();
            vector.extend(label.as_bytes());
            vector.push(markers::NUMBER_MARKER);
            vector.write_f64::<BigEndian>(1.0).unwrap();
        }
        vector
            .write_u16::<BigEndian>(markers::UTF_8_EMPTY_MARKER)
            .unwrap();
        vector.push(markers::OBJECT_END_MARKER);

        let mut input = Cursor::new(vector);
        let result = deserialize(&mut input).unwrap();

        let object = match &result[0] {
            Amf0Value::Object(properties) => properties,
            other => panic!("Expected object, got {:?}", other),
        };

        let keys: Vec<&str> = object.iter().map(|(name, _)| name).collect();
        assert_eq!(keys, vec!["zulu", "alpha", "mike"]);
    }

    #[test]
    fn can_deserialize_ecma_array() {
        let mut vector = vec![];
        vector.push(markers::ECMA_ARRAY_MARKER);
        vector.write_u32::<BigEndian>(2).unwrap();
        vector.write_u16::<BigEndian>(5).unwrap();
        vector.extend("test1".as_bytes());
        vector.push(markers::NUMBER_MARKER);
        vector.write_f64::<BigEndian>(1.0).unwrap();
        vector.write_u16::<BigEndian>(5).unwrap();
        vector.extend("test2".as_bytes());
        vector.write_u8(markers::STRING_MARKER).unwrap();
        vector.write_u16::<BigEndian>(6).unwrap();
        vector.extend("second".as_bytes());
        vector
            .write_u16::<BigEndian>(markers::UTF_8_EMPTY_MARKER)
            .unwrap();
        vector.push(markers::OBJECT_END_MARKER);

        let mut input = Cursor::new(vector);
        let result = deserialize(&mut input).unwrap();

        let mut properties = Amf0Object::new();
        properties.insert("test1", Amf0Value::Number(1.0));
        properties.insert("test2", Amf0Value::Utf8String("second".to_string()));

        let expected = vec![Amf0Value::EcmaArray(properties)];
        assert_eq!(result, expected);
    }

    #[test]
    fn can_deserialize_strict_array() {
        let mut vector = vec![];
        vector.push(markers::STRICT_ARRAY_MARKER);
        vector.write_u32::<BigEndian>(2).unwrap();
        vector.push(markers::NUMBER_MARKER);
        vector.write_f64::<BigEndian>(1.0).unwrap();
        vector.push(markers::NUMBER_MARKER);
        vector.write_f64::<BigEndian>(2.0).unwrap();

        let mut input = Cursor::new(vector);
        let result = deserialize(&mut input).unwrap();

        let array = vec![Amf0Value::Number(1.0), Amf0Value::Number(2.0)];

        let expected = vec![Amf0Value::StrictArray(array)];
        assert_eq!(result, expected);
    }

    #[test]
    fn unknown_marker_fails_whole_message() {
        let mut vector = vec![];
        vector.write_u8(markers::NUMBER_MARKER).unwrap();
        vector.write_f64::<BigEndian>(1.0).unwrap();
        vector.write_u8(0x0F).unwrap();

        let mut input = Cursor::new(vector);
        let result = deserialize(&mut input);

        assert!(matches!(
            result,
            Err(Amf0DeserializationError::UnknownMarker { marker: 0x0F })
        ));
    }

    #[test]
    fn top_level_object_end_marker_fails() {
        let vector = vec![markers::OBJECT_END_MARKER];

        let mut input = Cursor::new(vector);
        let result = deserialize(&mut input);

        assert!(matches!(
            result,
            Err(Amf0DeserializationError::UnexpectedObjectEndMarker)
        ));
    }

    #[test]
    fn truncated_string_fails() {
        let mut vector = vec![];
        vector.write_u8(markers::STRING_MARKER).unwrap();
        vector.write_u16::<BigEndian>(10).unwrap();
        vector.extend("abc".as_bytes());

        let mut input = Cursor::new(vector);
        let result = deserialize(&mut input);

        assert!(result.is_err());
    }

    #[test]
    fn truncated_strict_array_fails() {
        let mut vector = vec![];
        vector.push(markers::STRICT_ARRAY_MARKER);
        vector.write_u32::<BigEndian>(2).unwrap();
        vector.push(markers::NUMBER_MARKER);
        vector.write_f64::<BigEndian>(1.0).unwrap();

        let mut input = Cursor::new(vector);
        let result = deserialize(&mut input);

        assert!(matches!(
            result,
            Err(Amf0DeserializationError::UnexpectedEof)
        ));
    }
}
