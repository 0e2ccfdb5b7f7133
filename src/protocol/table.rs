//! AMQP field tables.
//!
//! Tables carry the `headers` content property. The type tags differ
//! between plain AMQP 0-9-1 and the RabbitMQ dialect:
//!
//! | Value      | amqp-0-9-1 | amqp-rabbit |
//! |------------|------------|-------------|
//! | i16        | `U`        | `s`         |
//! | i64        | `L`        | `l`         |
//! | u64        | `l`        | -           |
//! | short str  | `s`        | -           |
//! | byte array | -          | `x`         |
//!
//! All other tags (`t b B u I i f d D S A T F V`) are shared.

use std::collections::BTreeMap;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::wire_format::{
    ensure, read_long, read_longlong, read_longstr, read_octet, read_shortstr, write_longstr,
    write_shortstr, ProtoVersion,
};
use crate::error::{CodecError, Result};

/// Field table. Ordered so that encoding is deterministic.
pub type Table = BTreeMap<String, FieldValue>;

/// Fixed-point decimal: `value / 10^scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decimal {
    pub scale: u8,
    pub value: i32,
}

/// A single field-table value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Decimal(Decimal),
    ShortStr(String),
    LongStr(Bytes),
    Array(Vec<FieldValue>),
    Timestamp(u64),
    Table(Table),
    Void,
    ByteArray(Bytes),
}

impl FieldValue {
    fn kind(&self) -> &'static str {
        match self {
            FieldValue::Bool(_) => "bool",
            FieldValue::I8(_) => "i8",
            FieldValue::U8(_) => "u8",
            FieldValue::I16(_) => "i16",
            FieldValue::U16(_) => "u16",
            FieldValue::I32(_) => "i32",
            FieldValue::U32(_) => "u32",
            FieldValue::I64(_) => "i64",
            FieldValue::U64(_) => "u64",
            FieldValue::F32(_) => "f32",
            FieldValue::F64(_) => "f64",
            FieldValue::Decimal(_) => "decimal",
            FieldValue::ShortStr(_) => "short string",
            FieldValue::LongStr(_) => "long string",
            FieldValue::Array(_) => "array",
            FieldValue::Timestamp(_) => "timestamp",
            FieldValue::Table(_) => "table",
            FieldValue::Void => "void",
            FieldValue::ByteArray(_) => "byte array",
        }
    }

    /// Type tag for this value under `version`, if it has one.
    fn tag(&self, version: ProtoVersion) -> Option<u8> {
        let rabbit = version == ProtoVersion::Rabbit;
        let tag = match self {
            FieldValue::Bool(_) => b't',
            FieldValue::I8(_) => b'b',
            FieldValue::U8(_) => b'B',
            FieldValue::I16(_) if rabbit => b's',
            FieldValue::I16(_) => b'U',
            FieldValue::U16(_) => b'u',
            FieldValue::I32(_) => b'I',
            FieldValue::U32(_) => b'i',
            FieldValue::I64(_) if rabbit => b'l',
            FieldValue::I64(_) => b'L',
            FieldValue::U64(_) if rabbit => return None,
            FieldValue::U64(_) => b'l',
            FieldValue::F32(_) => b'f',
            FieldValue::F64(_) => b'd',
            FieldValue::Decimal(_) => b'D',
            FieldValue::ShortStr(_) if rabbit => return None,
            FieldValue::ShortStr(_) => b's',
            FieldValue::LongStr(_) => b'S',
            FieldValue::Array(_) => b'A',
            FieldValue::Timestamp(_) => b'T',
            FieldValue::Table(_) => b'F',
            FieldValue::Void => b'V',
            FieldValue::ByteArray(_) if rabbit => b'x',
            FieldValue::ByteArray(_) => return None,
        };
        Some(tag)
    }
}

/// Write a field table (4-byte size prefix, then name/value pairs).
pub fn write_table<B: BufMut>(buf: &mut B, table: &Table, version: ProtoVersion) -> Result<()> {
    let mut inner = BytesMut::new();
    for (name, value) in table {
        write_shortstr(&mut inner, name)?;
        write_field_value(&mut inner, value, version)?;
    }
    write_longstr(buf, &inner)
}

/// Read a field table.
pub fn read_table<B: Buf>(buf: &mut B, version: ProtoVersion) -> Result<Table> {
    let mut inner = read_longstr(buf)?;
    let mut table = Table::new();
    while inner.has_remaining() {
        let name = read_shortstr(&mut inner)?;
        let value = read_field_value(&mut inner, version)?;
        table.insert(name, value);
    }
    Ok(table)
}

fn write_array<B: BufMut>(buf: &mut B, values: &[FieldValue], version: ProtoVersion) -> Result<()> {
    let mut inner = BytesMut::new();
    for value in values {
        write_field_value(&mut inner, value, version)?;
    }
    write_longstr(buf, &inner)
}

fn read_array<B: Buf>(buf: &mut B, version: ProtoVersion) -> Result<Vec<FieldValue>> {
    let mut inner = read_longstr(buf)?;
    let mut values = Vec::new();
    while inner.has_remaining() {
        values.push(read_field_value(&mut inner, version)?);
    }
    Ok(values)
}

fn write_field_value<B: BufMut>(buf: &mut B, value: &FieldValue, version: ProtoVersion) -> Result<()> {
    let tag = value
        .tag(version)
        .ok_or(CodecError::UnsupportedFieldValue {
            kind: value.kind(),
            version,
        })?;
    buf.put_u8(tag);

    match value {
        FieldValue::Bool(v) => buf.put_u8(u8::from(*v)),
        FieldValue::I8(v) => buf.put_i8(*v),
        FieldValue::U8(v) => buf.put_u8(*v),
        FieldValue::I16(v) => buf.put_i16(*v),
        FieldValue::U16(v) => buf.put_u16(*v),
        FieldValue::I32(v) => buf.put_i32(*v),
        FieldValue::U32(v) => buf.put_u32(*v),
        FieldValue::I64(v) => buf.put_i64(*v),
        FieldValue::U64(v) | FieldValue::Timestamp(v) => buf.put_u64(*v),
        FieldValue::F32(v) => buf.put_f32(*v),
        FieldValue::F64(v) => buf.put_f64(*v),
        FieldValue::Decimal(d) => {
            buf.put_u8(d.scale);
            buf.put_i32(d.value);
        }
        FieldValue::ShortStr(s) => write_shortstr(buf, s)?,
        FieldValue::LongStr(b) | FieldValue::ByteArray(b) => write_longstr(buf, b)?,
        FieldValue::Array(values) => write_array(buf, values, version)?,
        FieldValue::Table(table) => write_table(buf, table, version)?,
        FieldValue::Void => {}
    }
    Ok(())
}

fn read_field_value<B: Buf>(buf: &mut B, version: ProtoVersion) -> Result<FieldValue> {
    let rabbit = version == ProtoVersion::Rabbit;
    let tag = read_octet(buf)?;

    let value = match tag {
        b't' => FieldValue::Bool(read_octet(buf)? != 0),
        b'b' => {
            ensure(buf, 1)?;
            FieldValue::I8(buf.get_i8())
        }
        b'B' => FieldValue::U8(read_octet(buf)?),
        b's' if rabbit => {
            ensure(buf, 2)?;
            FieldValue::I16(buf.get_i16())
        }
        b's' => FieldValue::ShortStr(read_shortstr(buf)?),
        b'U' if !rabbit => {
            ensure(buf, 2)?;
            FieldValue::I16(buf.get_i16())
        }
        b'u' => {
            ensure(buf, 2)?;
            FieldValue::U16(buf.get_u16())
        }
        b'I' => {
            ensure(buf, 4)?;
            FieldValue::I32(buf.get_i32())
        }
        b'i' => FieldValue::U32(read_long(buf)?),
        b'l' if rabbit => {
            ensure(buf, 8)?;
            FieldValue::I64(buf.get_i64())
        }
        b'l' => FieldValue::U64(read_longlong(buf)?),
        b'L' if !rabbit => {
            ensure(buf, 8)?;
            FieldValue::I64(buf.get_i64())
        }
        b'f' => {
            ensure(buf, 4)?;
            FieldValue::F32(buf.get_f32())
        }
        b'd' => {
            ensure(buf, 8)?;
            FieldValue::F64(buf.get_f64())
        }
        b'D' => {
            ensure(buf, 5)?;
            let scale = buf.get_u8();
            let value = buf.get_i32();
            FieldValue::Decimal(Decimal { scale, value })
        }
        b'S' => FieldValue::LongStr(read_longstr(buf)?),
        b'A' => FieldValue::Array(read_array(buf, version)?),
        b'T' => FieldValue::Timestamp(read_longlong(buf)?),
        b'F' => FieldValue::Table(read_table(buf, version)?),
        b'V' => FieldValue::Void,
        b'x' if rabbit => FieldValue::ByteArray(read_longstr(buf)?),
        other => {
            return Err(CodecError::UnknownFieldType {
                tag: char::from(other),
                version,
            })
        }
    };
    Ok(value)
}
