//! Test database writer
//!
//! Builds small, well-formed MMDB images in memory so the integration
//! tests do not depend on shipped database files. Covers the pieces the
//! reader exercises: a binary trie over address bits serialized at any of
//! the three record widths, a data section with string interning (so
//! pointer records occur organically), and a metadata block behind the
//! marker.

use mmdblite::{DataValue, METADATA_MARKER};
use std::collections::HashMap;
use std::net::IpAddr;

/// Data-section encoder with string interning.
///
/// Repeated strings (including map keys) are written once and referenced
/// through type-1 pointers afterwards, like production writers do.
pub struct DataSectionWriter {
    buf: Vec<u8>,
    strings: HashMap<String, u32>,
}

impl DataSectionWriter {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            strings: HashMap::new(),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Encode `value`, returning the offset its encoding starts at.
    pub fn write_value(&mut self, value: &DataValue) -> u32 {
        let offset = self.buf.len() as u32;
        match value {
            DataValue::String(s) => {
                return self.write_string(s);
            }
            DataValue::Double(d) => {
                self.write_ctrl(3, 8);
                self.buf.extend_from_slice(&d.to_be_bytes());
            }
            DataValue::Bytes(b) => {
                self.write_ctrl(4, b.len());
                self.buf.extend_from_slice(b);
            }
            DataValue::Uint16(n) => {
                self.write_ctrl(5, 2);
                self.buf.extend_from_slice(&n.to_be_bytes());
            }
            DataValue::Uint32(n) => {
                self.write_ctrl(6, 4);
                self.buf.extend_from_slice(&n.to_be_bytes());
            }
            DataValue::Map(m) => {
                self.write_ctrl(7, m.len());
                let mut pairs: Vec<_> = m.iter().collect();
                pairs.sort_by_key(|(k, _)| k.as_str());
                for (key, val) in pairs {
                    self.write_string(key);
                    self.write_value(val);
                }
            }
            DataValue::Int32(n) => {
                self.write_ctrl(8, 4);
                self.buf.extend_from_slice(&n.to_be_bytes());
            }
            DataValue::Uint64(n) => {
                self.write_ctrl(9, 8);
                self.buf.extend_from_slice(&n.to_be_bytes());
            }
            DataValue::Uint128(n) => {
                self.write_ctrl(10, 16);
                self.buf.extend_from_slice(&n.to_be_bytes());
            }
            DataValue::Array(a) => {
                self.write_ctrl(11, a.len());
                for val in a {
                    self.write_value(val);
                }
            }
            DataValue::Bool(b) => {
                self.write_ctrl(14, usize::from(*b));
            }
            DataValue::Float(f) => {
                self.write_ctrl(15, 4);
                self.buf.extend_from_slice(&f.to_be_bytes());
            }
        }
        offset
    }

    /// Write a string, interning repeats as pointers.
    fn write_string(&mut self, s: &str) -> u32 {
        if let Some(&at) = self.strings.get(s) {
            let offset = self.buf.len() as u32;
            self.write_pointer(at);
            return offset;
        }
        let offset = self.buf.len() as u32;
        self.write_ctrl(2, s.len());
        self.buf.extend_from_slice(s.as_bytes());
        self.strings.insert(s.to_string(), offset);
        offset
    }

    fn write_pointer(&mut self, target: u32) {
        if target < 2048 {
            self.buf.push(0x20 | ((target >> 8) & 7) as u8);
            self.buf.push((target & 0xFF) as u8);
        } else if target < 2048 + 524288 {
            let adjusted = target - 2048;
            self.buf.push(0x20 | (1 << 3) | ((adjusted >> 16) & 7) as u8);
            self.buf.push(((adjusted >> 8) & 0xFF) as u8);
            self.buf.push((adjusted & 0xFF) as u8);
        } else {
            self.buf.push(0x20 | (3 << 3));
            self.buf.extend_from_slice(&target.to_be_bytes());
        }
    }

    /// Control byte(s): type, extension byte for types above 7, then the
    /// size escapes.
    fn write_ctrl(&mut self, type_id: u8, size: usize) {
        let size_bits: u8 = match size {
            0..=28 => size as u8,
            29..=284 => 29,
            285..=65820 => 30,
            _ => 31,
        };
        if type_id < 8 {
            self.buf.push((type_id << 5) | size_bits);
        } else {
            self.buf.push(size_bits);
            self.buf.push(type_id - 7);
        }
        match size_bits {
            29 => self.buf.push((size - 29) as u8),
            30 => self
                .buf
                .extend_from_slice(&((size - 285) as u16).to_be_bytes()),
            31 => self
                .buf
                .extend_from_slice(&((size - 65821) as u32).to_be_bytes()[1..]),
            _ => {}
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Child {
    Empty,
    Node(usize),
    Data(u32),
}

struct TrieNode {
    left: Child,
    right: Child,
}

/// Builder for complete test databases.
pub struct TestDbBuilder {
    nodes: Vec<TrieNode>,
    data: DataSectionWriter,
    ip_version: u16,
    record_size: u16,
    metadata_record_size: Option<u16>,
}

impl TestDbBuilder {
    pub fn new(ip_version: u16, record_size: u16) -> Self {
        assert!(matches!(record_size, 24 | 28 | 32));
        Self {
            nodes: vec![TrieNode {
                left: Child::Empty,
                right: Child::Empty,
            }],
            data: DataSectionWriter::new(),
            ip_version,
            record_size,
            metadata_record_size: None,
        }
    }

    /// Lie about the record size in the metadata block (for bad-format
    /// tests); the tree is still serialized at the real width.
    pub fn metadata_record_size(&mut self, bits: u16) -> &mut Self {
        self.metadata_record_size = Some(bits);
        self
    }

    /// Insert a network given as an address string and prefix length.
    ///
    /// For a v6 database, v4 networks are inserted under the v4-mapped
    /// prefix (so `1.1.1.0/24` lands at `::ffff:1.1.1.0/120`).
    pub fn insert_net(&mut self, addr: &str, prefix_len: usize, value: &DataValue) {
        let addr: IpAddr = addr.parse().expect("test network address");
        match (addr, self.ip_version) {
            (IpAddr::V4(v4), 4) => self.insert(&v4.octets(), prefix_len, value),
            (IpAddr::V4(v4), _) => {
                self.insert(&v4.to_ipv6_mapped().octets(), 96 + prefix_len, value)
            }
            (IpAddr::V6(v6), 6) => self.insert(&v6.octets(), prefix_len, value),
            (IpAddr::V6(_), _) => panic!("cannot insert a v6 network into a v4 test database"),
        }
    }

    /// Insert a network given as raw address bytes.
    pub fn insert(&mut self, addr: &[u8], prefix_len: usize, value: &DataValue) {
        assert!(prefix_len > 0 && prefix_len <= addr.len() * 8);
        let data_offset = self.data.write_value(value);

        let mut node = 0usize;
        for i in 0..prefix_len {
            let bit = (addr[i >> 3] >> (7 - (i & 7))) & 1;
            if i == prefix_len - 1 {
                self.set_child(node, bit, Child::Data(data_offset));
            } else {
                node = match self.child(node, bit) {
                    Child::Node(n) => n,
                    Child::Empty => {
                        let n = self.nodes.len();
                        self.nodes.push(TrieNode {
                            left: Child::Empty,
                            right: Child::Empty,
                        });
                        self.set_child(node, bit, Child::Node(n));
                        n
                    }
                    Child::Data(_) => panic!("test networks must not overlap"),
                };
            }
        }
    }

    fn child(&self, node: usize, bit: u8) -> Child {
        if bit == 0 {
            self.nodes[node].left
        } else {
            self.nodes[node].right
        }
    }

    fn set_child(&mut self, node: usize, bit: u8, child: Child) {
        if bit == 0 {
            self.nodes[node].left = child;
        } else {
            self.nodes[node].right = child;
        }
    }

    /// Serialize the complete database image.
    pub fn build(&self) -> Vec<u8> {
        let node_count = self.nodes.len() as u32;
        let record_value = |child: Child| -> u32 {
            match child {
                Child::Empty => node_count,
                Child::Node(n) => n as u32,
                Child::Data(offset) => node_count + 16 + offset,
            }
        };

        let mut out = Vec::new();
        for node in &self.nodes {
            let left = record_value(node.left);
            let right = record_value(node.right);
            match self.record_size {
                24 => {
                    out.extend_from_slice(&left.to_be_bytes()[1..]);
                    out.extend_from_slice(&right.to_be_bytes()[1..]);
                }
                28 => {
                    out.extend_from_slice(&left.to_be_bytes()[1..]);
                    out.push((((left >> 24) & 0xF) << 4) as u8 | ((right >> 24) & 0xF) as u8);
                    out.extend_from_slice(&right.to_be_bytes()[1..]);
                }
                _ => {
                    out.extend_from_slice(&left.to_be_bytes());
                    out.extend_from_slice(&right.to_be_bytes());
                }
            }
        }

        out.extend_from_slice(&[0u8; 16]);
        out.extend_from_slice(&self.data.buf);
        out.extend_from_slice(METADATA_MARKER);
        out.extend_from_slice(&self.metadata_bytes(node_count));
        out
    }

    fn metadata_bytes(&self, node_count: u32) -> Vec<u8> {
        let mut description = HashMap::new();
        description.insert(
            "en".to_string(),
            DataValue::String("Test database".to_string()),
        );

        let mut meta = HashMap::new();
        meta.insert("node_count".to_string(), DataValue::Uint32(node_count));
        meta.insert(
            "record_size".to_string(),
            DataValue::Uint16(self.metadata_record_size.unwrap_or(self.record_size)),
        );
        meta.insert("ip_version".to_string(), DataValue::Uint16(self.ip_version));
        meta.insert(
            "binary_format_major_version".to_string(),
            DataValue::Uint16(2),
        );
        meta.insert(
            "binary_format_minor_version".to_string(),
            DataValue::Uint16(0),
        );
        meta.insert(
            "build_epoch".to_string(),
            DataValue::Uint64(1_700_000_000),
        );
        meta.insert(
            "database_type".to_string(),
            DataValue::String("Test-DB".to_string()),
        );
        meta.insert(
            "languages".to_string(),
            DataValue::Array(vec![
                DataValue::String("en".to_string()),
                DataValue::String("de".to_string()),
            ]),
        );
        meta.insert("description".to_string(), DataValue::Map(description));

        let mut writer = DataSectionWriter::new();
        writer.write_value(&DataValue::Map(meta));
        writer.into_bytes()
    }
}

/// Shorthand for a `{country: {iso_code: <code>}}` record.
pub fn country_record(code: &str) -> DataValue {
    let mut country = HashMap::new();
    country.insert(
        "iso_code".to_string(),
        DataValue::String(code.to_string()),
    );
    let mut record = HashMap::new();
    record.insert("country".to_string(), DataValue::Map(country));
    DataValue::Map(record)
}
