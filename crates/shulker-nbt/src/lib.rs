use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use bytes::{Buf, BytesMut};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::HashMap;
use std::io::{self, Read, Write};

/// A named binary tag. Byte arrays are held as `BytesMut` so a tree parsed
/// with [`Tag::read_buf`] shares memory with the buffer it was parsed from.
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    End,
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(BytesMut),
    String(String),
    List(Vec<Tag>),
    Compound(HashMap<String, Tag>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

/// Deepest list/compound nesting the readers accept.
pub const MAX_DEPTH: usize = 512;

// Upper bound on capacity reserved from an untrusted stream length.
const MAX_PREALLOCATED: usize = 1024;

fn invalid_data<E>(err: E) -> io::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    io::Error::new(io::ErrorKind::InvalidData, err)
}

fn array_length(length: i32) -> io::Result<usize> {
    usize::try_from(length).map_err(|_| invalid_data(format!("Negative array length: {}", length)))
}

fn read_length<R: Read>(reader: &mut R) -> io::Result<usize> {
    array_length(reader.read_i32::<BigEndian>()?)
}

fn invalid_input<E>(err: E) -> io::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    io::Error::new(io::ErrorKind::InvalidInput, err)
}

fn write_length<W: Write>(writer: &mut W, length: usize) -> io::Result<()> {
    let length = i32::try_from(length)
        .map_err(|_| invalid_input(format!("Array length {} exceeds {}", length, i32::MAX)))?;
    writer.write_i32::<BigEndian>(length)
}

fn write_string<W: Write>(writer: &mut W, value: &str) -> io::Result<()> {
    let length = u16::try_from(value.len()).map_err(|_| {
        invalid_input(format!("String length {} exceeds {}", value.len(), u16::MAX))
    })?;
    writer.write_u16::<BigEndian>(length)?;
    writer.write_all(value.as_bytes())
}

fn nested(depth: usize) -> io::Result<usize> {
    if depth >= MAX_DEPTH {
        return Err(invalid_data(format!("Nesting deeper than {}", MAX_DEPTH)));
    }
    Ok(depth + 1)
}

fn check_list_type(list_type: u8, length: usize) -> io::Result<()> {
    if list_type == 0 && length > 0 {
        return Err(invalid_data(format!("List of {} end tags", length)));
    }
    Ok(())
}

fn ensure(buf: &BytesMut, needed: usize) -> io::Result<()> {
    if buf.remaining() < needed {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("Need {} bytes, {} left", needed, buf.remaining()),
        ));
    }
    Ok(())
}

fn ensure_elements(buf: &BytesMut, count: usize, width: usize) -> io::Result<()> {
    let needed = count
        .checked_mul(width)
        .ok_or_else(|| invalid_data(format!("Array length overflow: {}", count)))?;
    ensure(buf, needed)
}

fn read_buf_length(buf: &mut BytesMut) -> io::Result<usize> {
    ensure(buf, 4)?;
    array_length(buf.get_i32())
}

fn read_buf_string(buf: &mut BytesMut) -> io::Result<String> {
    ensure(buf, 2)?;
    let length = buf.get_u16() as usize;
    ensure(buf, length)?;
    let bytes = buf.split_to(length);
    String::from_utf8(bytes.to_vec()).map_err(invalid_data)
}

impl Tag {
    pub fn get_type_id(&self) -> u8 {
        match self {
            Tag::End => 0,
            Tag::Byte(_) => 1,
            Tag::Short(_) => 2,
            Tag::Int(_) => 3,
            Tag::Long(_) => 4,
            Tag::Float(_) => 5,
            Tag::Double(_) => 6,
            Tag::ByteArray(_) => 7,
            Tag::String(_) => 8,
            Tag::List(_) => 9,
            Tag::Compound(_) => 10,
            Tag::IntArray(_) => 11,
            Tag::LongArray(_) => 12,
        }
    }

    /// Reads one named tag from a stream. Byte arrays are copied out of the
    /// stream into fresh buffers.
    pub fn read<R: Read>(reader: &mut R) -> io::Result<(String, Tag)> {
        Tag::read_named(reader, 0)
    }

    fn read_named<R: Read>(reader: &mut R, depth: usize) -> io::Result<(String, Tag)> {
        let type_id = reader.read_u8()?;
        if type_id == 0 {
            return Ok(("".to_owned(), Tag::End));
        }

        let name_length = reader.read_u16::<BigEndian>()?;
        let mut name_bytes = vec![0u8; name_length as usize];
        reader.read_exact(&mut name_bytes)?;
        let name = String::from_utf8(name_bytes).map_err(invalid_data)?;

        let tag = Tag::read_payload(reader, type_id, depth)?;
        Ok((name, tag))
    }

    fn read_payload<R: Read>(reader: &mut R, type_id: u8, depth: usize) -> io::Result<Tag> {
        match type_id {
            0 => Ok(Tag::End),
            1 => Ok(Tag::Byte(reader.read_i8()?)),
            2 => Ok(Tag::Short(reader.read_i16::<BigEndian>()?)),
            3 => Ok(Tag::Int(reader.read_i32::<BigEndian>()?)),
            4 => Ok(Tag::Long(reader.read_i64::<BigEndian>()?)),
            5 => Ok(Tag::Float(reader.read_f32::<BigEndian>()?)),
            6 => Ok(Tag::Double(reader.read_f64::<BigEndian>()?)),
            7 => {
                let length = read_length(reader)?;
                let mut bytes = Vec::with_capacity(length.min(MAX_PREALLOCATED));
                reader.by_ref().take(length as u64).read_to_end(&mut bytes)?;
                if bytes.len() < length {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("Byte array of {} cut short at {}", length, bytes.len()),
                    ));
                }
                Ok(Tag::ByteArray(BytesMut::from(&bytes[..])))
            }
            8 => {
                let length = reader.read_u16::<BigEndian>()?;
                let mut bytes = vec![0u8; length as usize];
                reader.read_exact(&mut bytes)?;
                String::from_utf8(bytes).map(Tag::String).map_err(invalid_data)
            }
            9 => {
                let depth = nested(depth)?;
                let list_type = reader.read_u8()?;
                let length = read_length(reader)?;
                check_list_type(list_type, length)?;
                let mut list = Vec::with_capacity(length.min(MAX_PREALLOCATED));
                for _ in 0..length {
                    list.push(Tag::read_payload(reader, list_type, depth)?);
                }
                Ok(Tag::List(list))
            }
            10 => {
                let depth = nested(depth)?;
                let mut compound = HashMap::new();
                loop {
                    let (name, tag) = Tag::read_named(reader, depth)?;
                    if let Tag::End = tag {
                        break;
                    }
                    compound.insert(name, tag);
                }
                Ok(Tag::Compound(compound))
            }
            11 => {
                let length = read_length(reader)?;
                let mut ints = Vec::with_capacity(length.min(MAX_PREALLOCATED));
                for _ in 0..length {
                    ints.push(reader.read_i32::<BigEndian>()?);
                }
                Ok(Tag::IntArray(ints))
            }
            12 => {
                let length = read_length(reader)?;
                let mut longs = Vec::with_capacity(length.min(MAX_PREALLOCATED));
                for _ in 0..length {
                    longs.push(reader.read_i64::<BigEndian>()?);
                }
                Ok(Tag::LongArray(longs))
            }
            _ => Err(invalid_data(format!("Invalid tag type: {}", type_id))),
        }
    }

    /// Reads one named tag out of an in-memory buffer, consuming it from the
    /// front. Byte arrays are split off `buf` without copying.
    pub fn read_buf(buf: &mut BytesMut) -> io::Result<(String, Tag)> {
        Tag::read_buf_named(buf, 0)
    }

    fn read_buf_named(buf: &mut BytesMut, depth: usize) -> io::Result<(String, Tag)> {
        ensure(buf, 1)?;
        let type_id = buf.get_u8();
        if type_id == 0 {
            return Ok(("".to_owned(), Tag::End));
        }

        let name = read_buf_string(buf)?;
        let tag = Tag::read_buf_payload(buf, type_id, depth)?;
        Ok((name, tag))
    }

    fn read_buf_payload(buf: &mut BytesMut, type_id: u8, depth: usize) -> io::Result<Tag> {
        match type_id {
            0 => Ok(Tag::End),
            1 => {
                ensure(buf, 1)?;
                Ok(Tag::Byte(buf.get_i8()))
            }
            2 => {
                ensure(buf, 2)?;
                Ok(Tag::Short(buf.get_i16()))
            }
            3 => {
                ensure(buf, 4)?;
                Ok(Tag::Int(buf.get_i32()))
            }
            4 => {
                ensure(buf, 8)?;
                Ok(Tag::Long(buf.get_i64()))
            }
            5 => {
                ensure(buf, 4)?;
                Ok(Tag::Float(buf.get_f32()))
            }
            6 => {
                ensure(buf, 8)?;
                Ok(Tag::Double(buf.get_f64()))
            }
            7 => {
                let length = read_buf_length(buf)?;
                ensure(buf, length)?;
                Ok(Tag::ByteArray(buf.split_to(length)))
            }
            8 => read_buf_string(buf).map(Tag::String),
            9 => {
                let depth = nested(depth)?;
                ensure(buf, 1)?;
                let list_type = buf.get_u8();
                let length = read_buf_length(buf)?;
                check_list_type(list_type, length)?;
                let mut list = Vec::with_capacity(length.min(buf.remaining()));
                for _ in 0..length {
                    list.push(Tag::read_buf_payload(buf, list_type, depth)?);
                }
                Ok(Tag::List(list))
            }
            10 => {
                let depth = nested(depth)?;
                let mut compound = HashMap::new();
                loop {
                    let (name, tag) = Tag::read_buf_named(buf, depth)?;
                    if let Tag::End = tag {
                        break;
                    }
                    compound.insert(name, tag);
                }
                Ok(Tag::Compound(compound))
            }
            11 => {
                let length = read_buf_length(buf)?;
                ensure_elements(buf, length, 4)?;
                Ok(Tag::IntArray((0..length).map(|_| buf.get_i32()).collect()))
            }
            12 => {
                let length = read_buf_length(buf)?;
                ensure_elements(buf, length, 8)?;
                Ok(Tag::LongArray((0..length).map(|_| buf.get_i64()).collect()))
            }
            _ => Err(invalid_data(format!("Invalid tag type: {}", type_id))),
        }
    }

    pub fn write<W: Write>(&self, writer: &mut W, name: &str) -> io::Result<()> {
        writer.write_u8(self.get_type_id())?;

        if !matches!(self, Tag::End) {
            write_string(writer, name)?;
        }

        self.write_payload(writer)
    }

    fn write_payload<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        match self {
            Tag::End => Ok(()),
            Tag::Byte(v) => writer.write_i8(*v),
            Tag::Short(v) => writer.write_i16::<BigEndian>(*v),
            Tag::Int(v) => writer.write_i32::<BigEndian>(*v),
            Tag::Long(v) => writer.write_i64::<BigEndian>(*v),
            Tag::Float(v) => writer.write_f32::<BigEndian>(*v),
            Tag::Double(v) => writer.write_f64::<BigEndian>(*v),
            Tag::ByteArray(v) => {
                write_length(writer, v.len())?;
                writer.write_all(v)
            }
            Tag::String(v) => write_string(writer, v),
            Tag::List(v) => {
                if v.is_empty() {
                    writer.write_u8(0)?; // TAG_End for empty lists
                } else {
                    writer.write_u8(v[0].get_type_id())?;
                }
                write_length(writer, v.len())?;
                for tag in v {
                    tag.write_payload(writer)?;
                }
                Ok(())
            }
            Tag::Compound(v) => {
                for (name, tag) in v {
                    tag.write(writer, name)?;
                }
                Tag::End.write(writer, "")?;
                Ok(())
            }
            Tag::IntArray(v) => {
                write_length(writer, v.len())?;
                for &i in v {
                    writer.write_i32::<BigEndian>(i)?;
                }
                Ok(())
            }
            Tag::LongArray(v) => {
                write_length(writer, v.len())?;
                for &l in v {
                    writer.write_i64::<BigEndian>(l)?;
                }
                Ok(())
            }
        }
    }

    pub fn as_compound(&self) -> Option<&HashMap<String, Tag>> {
        match self {
            Tag::Compound(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_compound_mut(&mut self) -> Option<&mut HashMap<String, Tag>> {
        match self {
            Tag::Compound(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Vec<Tag>> {
        match self {
            Tag::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&String> {
        match self {
            Tag::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_byte_array(&self) -> Option<&[u8]> {
        match self {
            Tag::ByteArray(bytes) => Some(&bytes[..]),
            _ => None,
        }
    }

    pub fn as_long_array(&self) -> Option<&[i64]> {
        match self {
            Tag::LongArray(longs) => Some(longs.as_slice()),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Tag::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i8(&self) -> Option<i8> {
        match self {
            Tag::Byte(n) => Some(*n),
            _ => None,
        }
    }

    // Compound lookups. All return None when `self` is not a compound, the
    // key is absent, or the value has another type.

    pub fn get(&self, name: &str) -> Option<&Tag> {
        self.as_compound()?.get(name)
    }

    pub fn get_byte(&self, name: &str) -> Option<i8> {
        self.get(name)?.as_i8()
    }

    pub fn get_int(&self, name: &str) -> Option<i32> {
        self.get(name)?.as_i32()
    }

    pub fn get_string(&self, name: &str) -> Option<&String> {
        self.get(name)?.as_string()
    }

    pub fn get_list(&self, name: &str) -> Option<&Vec<Tag>> {
        self.get(name)?.as_list()
    }

    pub fn get_long_array(&self, name: &str) -> Option<&[i64]> {
        self.get(name)?.as_long_array()
    }

    pub fn get_byte_array(&self, name: &str) -> Option<&[u8]> {
        self.get(name)?.as_byte_array()
    }

    pub fn get_byte_array_or<'a>(&'a self, name: &str, default: &'a [u8]) -> &'a [u8] {
        self.get_byte_array(name).unwrap_or(default)
    }

    /// Moves a byte array out of this compound, handing over its buffer
    /// without copying. Values of any other type are left in place.
    pub fn take_byte_array(&mut self, name: &str) -> Option<BytesMut> {
        let map = self.as_compound_mut()?;
        if !matches!(map.get(name), Some(Tag::ByteArray(_))) {
            return None;
        }
        match map.remove(name) {
            Some(Tag::ByteArray(bytes)) => Some(bytes),
            _ => None,
        }
    }

    /// Inserts into a compound, returning the replaced value. No-op on other tags.
    pub fn insert(&mut self, name: impl Into<String>, tag: Tag) -> Option<Tag> {
        self.as_compound_mut()?.insert(name.into(), tag)
    }
}

// NBTFile represents a complete NBT file with compression support
pub struct NBTFile {
    pub root: Tag,
    pub name: String,
}

impl NBTFile {
    pub fn new(name: String, root: Tag) -> Self {
        NBTFile { root, name }
    }

    pub fn read<R: Read>(reader: &mut R) -> io::Result<Self> {
        let (name, root) = Tag::read(reader)?;
        Ok(NBTFile { root, name })
    }

    /// Parses an uncompressed file held in memory; byte arrays alias `data`.
    pub fn from_bytes(mut data: BytesMut) -> io::Result<Self> {
        let (name, root) = Tag::read_buf(&mut data)?;
        Ok(NBTFile { root, name })
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.root.write(writer, &self.name)
    }

    pub fn read_gzip<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut decoder = GzDecoder::new(reader);
        Self::read(&mut decoder)
    }

    /// Inflates a gzip file into one buffer, then parses it without further copies.
    pub fn from_gzip_bytes(data: &[u8]) -> io::Result<Self> {
        let mut inflated = Vec::new();
        GzDecoder::new(data).read_to_end(&mut inflated)?;
        Self::from_bytes(BytesMut::from(&inflated[..]))
    }

    pub fn write_gzip<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut encoder = GzEncoder::new(writer, Compression::default());
        self.write(&mut encoder)?;
        encoder.finish()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn bytes(data: &[u8]) -> BytesMut {
        BytesMut::from(data)
    }

    #[test]
    fn test_tag_type_ids() {
        assert_eq!(Tag::End.get_type_id(), 0);
        assert_eq!(Tag::Byte(0).get_type_id(), 1);
        assert_eq!(Tag::Short(0).get_type_id(), 2);
        assert_eq!(Tag::Int(0).get_type_id(), 3);
        assert_eq!(Tag::Long(0).get_type_id(), 4);
        assert_eq!(Tag::Float(0.0).get_type_id(), 5);
        assert_eq!(Tag::Double(0.0).get_type_id(), 6);
        assert_eq!(Tag::ByteArray(BytesMut::new()).get_type_id(), 7);
        assert_eq!(Tag::String("".to_string()).get_type_id(), 8);
        assert_eq!(Tag::List(vec![]).get_type_id(), 9);
        assert_eq!(Tag::Compound(HashMap::new()).get_type_id(), 10);
        assert_eq!(Tag::IntArray(vec![]).get_type_id(), 11);
        assert_eq!(Tag::LongArray(vec![]).get_type_id(), 12);
    }

    #[test]
    fn test_compound_lookups() {
        let mut map = HashMap::new();
        map.insert("Y".to_string(), Tag::Byte(4));
        map.insert("Blocks".to_string(), Tag::ByteArray(bytes(&[1, 2, 3])));
        map.insert("xPos".to_string(), Tag::Int(-3));
        map.insert("States".to_string(), Tag::LongArray(vec![7, 8]));
        let tag = Tag::Compound(map);

        assert_eq!(tag.get_byte("Y"), Some(4));
        assert_eq!(tag.get_int("xPos"), Some(-3));
        assert_eq!(tag.get_byte_array("Blocks"), Some(&[1u8, 2, 3][..]));
        assert_eq!(tag.get_long_array("States"), Some(&[7i64, 8][..]));

        // wrong type or missing key
        assert_eq!(tag.get_byte("xPos"), None);
        assert_eq!(tag.get_byte_array("Add"), None);
        assert_eq!(tag.get_byte_array_or("Add", &[9u8][..]), &[9u8][..]);
        assert_eq!(Tag::Int(1).get_byte("Y"), None);
    }

    #[test]
    fn test_take_byte_array() {
        let mut tag = Tag::Compound(HashMap::new());
        tag.insert("Data", Tag::ByteArray(bytes(&[5, 6])));
        tag.insert("Y", Tag::Byte(1));

        assert_eq!(tag.take_byte_array("Y"), None);
        assert_eq!(tag.get_byte("Y"), Some(1));

        assert_eq!(tag.take_byte_array("Data"), Some(bytes(&[5, 6])));
        assert!(tag.get("Data").is_none());
        assert_eq!(tag.take_byte_array("Data"), None);
    }

    #[test]
    fn test_insert_on_non_compound() {
        let mut tag = Tag::Int(0);
        assert_eq!(tag.insert("a", Tag::Int(1)), None);
        assert_eq!(tag, Tag::Int(0));
    }

    #[test]
    fn test_tag_read_write() {
        let test_cases = vec![
            (Tag::Byte(42), "byte"),
            (Tag::Short(1234), "short"),
            (Tag::Int(12345678), "int"),
            (Tag::Long(123456789012), "long"),
            (Tag::Float(3.14), "float"),
            (Tag::Double(3.14159), "double"),
            (Tag::ByteArray(bytes(&[1, 2, 3])), "bytearray"),
            (Tag::String("Hello, World!".to_string()), "string"),
            (
                Tag::List(vec![Tag::Int(1), Tag::Int(2), Tag::Int(3)]),
                "list",
            ),
            (Tag::IntArray(vec![1, 2, 3]), "intarray"),
            (Tag::LongArray(vec![1, 2, 3]), "longarray"),
        ];

        for (tag, name) in test_cases {
            let mut buffer = Vec::new();
            tag.write(&mut buffer, name).unwrap();

            let (read_name, read_tag) = Tag::read(&mut Cursor::new(buffer.clone())).unwrap();
            assert_eq!(read_name, name);
            assert_eq!(read_tag, tag);

            let (buf_name, buf_tag) = Tag::read_buf(&mut BytesMut::from(&buffer[..])).unwrap();
            assert_eq!(buf_name, name);
            assert_eq!(buf_tag, tag);
        }
    }

    #[test]
    fn test_compound_tag_read_write() {
        let mut compound = HashMap::new();
        compound.insert("byte".to_string(), Tag::Byte(42));
        compound.insert("string".to_string(), Tag::String("test".to_string()));
        compound.insert(
            "list".to_string(),
            Tag::List(vec![Tag::Int(1), Tag::Int(2)]),
        );

        let tag = Tag::Compound(compound);

        let mut buffer = Vec::new();
        tag.write(&mut buffer, "root").unwrap();

        let mut cursor = Cursor::new(buffer);
        let (name, read_tag) = Tag::read(&mut cursor).unwrap();

        assert_eq!(name, "root");
        assert_eq!(read_tag, tag);
    }

    #[test]
    fn test_read_buf_is_zero_copy() {
        let mut compound = HashMap::new();
        compound.insert("Blocks".to_string(), Tag::ByteArray(bytes(&[7u8; 64])));
        let mut encoded = Vec::new();
        Tag::Compound(compound).write(&mut encoded, "").unwrap();

        let mut data = BytesMut::from(&encoded[..]);
        let start = data.as_ptr() as usize;
        let end = start + data.len();

        let (_, mut tag) = Tag::read_buf(&mut data).unwrap();
        let blocks = tag.take_byte_array("Blocks").unwrap();
        let ptr = blocks.as_ptr() as usize;
        assert!(ptr >= start && ptr + blocks.len() <= end);
        assert!(data.is_empty());
    }

    #[test]
    fn test_read_buf_truncated() {
        let mut buffer = Vec::new();
        Tag::ByteArray(bytes(&[1, 2, 3, 4])).write(&mut buffer, "a").unwrap();
        buffer.truncate(buffer.len() - 2);

        let err = Tag::read_buf(&mut BytesMut::from(&buffer[..])).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_negative_length_rejected() {
        let mut buffer = vec![7u8, 0, 1, b'a'];
        buffer.extend_from_slice(&(-1i32).to_be_bytes());

        let err = Tag::read(&mut Cursor::new(buffer.clone())).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        let err = Tag::read_buf(&mut BytesMut::from(&buffer[..])).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    fn nested_lists(levels: usize) -> Vec<u8> {
        let mut buffer = vec![9u8, 0, 0];
        for _ in 1..levels {
            buffer.push(9);
            buffer.extend_from_slice(&1i32.to_be_bytes());
        }
        buffer.push(0);
        buffer.extend_from_slice(&0i32.to_be_bytes());
        buffer
    }

    fn read_both(buffer: &[u8]) -> (io::Result<Tag>, io::Result<Tag>) {
        (
            Tag::read(&mut Cursor::new(buffer.to_vec())).map(|(_, tag)| tag),
            Tag::read_buf(&mut BytesMut::from(buffer)).map(|(_, tag)| tag),
        )
    }

    #[test]
    fn test_nesting_limit() {
        let (read, buf) = read_both(&nested_lists(500));
        assert!(read.is_ok());
        assert_eq!(read.unwrap(), buf.unwrap());

        let (read, buf) = read_both(&nested_lists(600));
        assert_eq!(read.unwrap_err().kind(), io::ErrorKind::InvalidData);
        assert_eq!(buf.unwrap_err().kind(), io::ErrorKind::InvalidData);

        let mut compounds = vec![10u8, 0, 0];
        for _ in 0..600 {
            compounds.extend_from_slice(&[10, 0, 1, b'c']);
        }
        let (read, buf) = read_both(&compounds);
        assert_eq!(read.unwrap_err().kind(), io::ErrorKind::InvalidData);
        assert_eq!(buf.unwrap_err().kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_huge_length_with_short_payload() {
        // int list, int array, long array and byte array each claiming i32::MAX entries
        for header in [&[9u8, 0, 0, 3][..], &[11, 0, 0][..], &[12, 0, 0][..], &[7, 0, 0][..]] {
            let mut buffer = header.to_vec();
            buffer.extend_from_slice(&i32::MAX.to_be_bytes());
            buffer.extend_from_slice(&[0, 0, 0, 1]);

            let (read, buf) = read_both(&buffer);
            assert_eq!(read.unwrap_err().kind(), io::ErrorKind::UnexpectedEof);
            assert_eq!(buf.unwrap_err().kind(), io::ErrorKind::UnexpectedEof);
        }
    }

    #[test]
    fn test_list_of_end_tags_rejected() {
        let mut buffer = vec![9u8, 0, 0, 0];
        buffer.extend_from_slice(&i32::MAX.to_be_bytes());
        let (read, buf) = read_both(&buffer);
        assert_eq!(read.unwrap_err().kind(), io::ErrorKind::InvalidData);
        assert_eq!(buf.unwrap_err().kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_write_rejects_oversized_strings() {
        let long = "a".repeat(70000);

        let err = Tag::Int(1).write(&mut io::sink(), &long).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);

        let err = Tag::String(long.clone()).write(&mut io::sink(), "s").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);

        let mut compound = Tag::Compound(HashMap::new());
        compound.insert(long, Tag::Byte(0));
        let err = NBTFile::new(String::new(), compound)
            .write(&mut io::sink())
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);

        let max = "b".repeat(u16::MAX as usize);
        let mut buffer = Vec::new();
        Tag::String(max.clone()).write(&mut buffer, "s").unwrap();
        let (_, tag) = Tag::read(&mut Cursor::new(buffer)).unwrap();
        assert_eq!(tag, Tag::String(max));
    }

    #[test]
    fn test_nbt_file() {
        let mut compound = HashMap::new();
        compound.insert("name".to_string(), Tag::String("Test".to_string()));
        compound.insert("value".to_string(), Tag::Int(42));

        let original = NBTFile::new("test".to_string(), Tag::Compound(compound));

        let mut buffer = Vec::new();
        original.write(&mut buffer).unwrap();

        let read = NBTFile::read(&mut Cursor::new(buffer.clone())).unwrap();
        assert_eq!(read.name, original.name);
        assert_eq!(read.root, original.root);

        let read = NBTFile::from_bytes(BytesMut::from(&buffer[..])).unwrap();
        assert_eq!(read.root, original.root);

        let mut gzip_buffer = Vec::new();
        original.write_gzip(&mut gzip_buffer).unwrap();

        let gzip_read = NBTFile::read_gzip(&mut Cursor::new(gzip_buffer.clone())).unwrap();
        assert_eq!(gzip_read.name, original.name);
        assert_eq!(gzip_read.root, original.root);

        let gzip_read = NBTFile::from_gzip_bytes(&gzip_buffer).unwrap();
        assert_eq!(gzip_read.root, original.root);
    }

    #[test]
    fn test_invalid_tag_type() {
        let result = Tag::read_payload(&mut Cursor::new(vec![255u8]), 255, 0);
        assert!(result.is_err());
        let result = Tag::read_buf_payload(&mut BytesMut::from(&[255u8][..]), 255, 0);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_list() {
        let tag = Tag::List(vec![]);
        let mut buffer = Vec::new();
        tag.write(&mut buffer, "empty").unwrap();

        let mut cursor = Cursor::new(buffer);
        let (name, read_tag) = Tag::read(&mut cursor).unwrap();

        assert_eq!(name, "empty");
        assert_eq!(read_tag, tag);
    }
}
