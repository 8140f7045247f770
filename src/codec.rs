//! Described-type encoder for terminus filters.
//!
//! `Data` is a small cursor-driven tree builder: values are put at the current
//! level, containers are entered with `enter` and left with `exit`. The tree is
//! turned into AMQP 1.0 bytes by `encode`.

use crate::constants;
use crate::error::CodecError;

type CodecResult<T> = std::result::Result<T, CodecError>;

// === ENCODER SEAM ===
pub trait Encoder {
    fn put_map(&mut self) -> CodecResult<()>;
    fn put_described(&mut self) -> CodecResult<()>;
    fn put_symbol(&mut self, symbol: &str) -> CodecResult<()>;
    fn put_ulong(&mut self, value: u64) -> CodecResult<()>;
    fn put_string(&mut self, value: &str) -> CodecResult<()>;
    /// Descend into the container that was put last.
    fn enter(&mut self) -> CodecResult<()>;
    fn exit(&mut self) -> CodecResult<()>;
}

// === DECODED VIEW ===
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Ulong(u64),
    Symbol(String),
    String(String),
    Map(Vec<(Value, Value)>),
    Described(Box<Value>, Box<Value>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Atom {
    Ulong(u64),
    Symbol(String),
    String(String),
    Map,
    Described,
}

impl Atom {
    fn is_container(&self) -> bool {
        matches!(self, Atom::Map | Atom::Described)
    }

    fn type_name(&self) -> &'static str {
        match self {
            Atom::Ulong(_) => "ulong",
            Atom::Symbol(_) => "symbol",
            Atom::String(_) => "string",
            Atom::Map => "map",
            Atom::Described => "described",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Node {
    atom: Atom,
    children: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Data {
    nodes: Vec<Node>,
    roots: Vec<usize>,
    parents: Vec<usize>,
    last: Option<usize>,
    limit: Option<usize>,
}

impl Data {
    pub fn new() -> Self {
        Self::default()
    }

    /// A buffer that rejects any write pushing the encoded size past `limit` bytes.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Empty buffer carrying the same size limit.
    pub fn empty_like(&self) -> Self {
        Self {
            limit: self.limit,
            ..Self::default()
        }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn encode(&self) -> CodecResult<Vec<u8>> {
        if !self.parents.is_empty() {
            return Err(CodecError::Framing(format!(
                "{} container(s) still entered",
                self.parents.len()
            )));
        }
        let mut buf = Vec::new();
        for &root in &self.roots {
            self.write_node(root, &mut buf, true)?;
        }
        Ok(buf)
    }

    pub fn values(&self) -> CodecResult<Vec<Value>> {
        self.roots.iter().map(|&root| self.to_value(root)).collect()
    }

    fn encoded_len(&self) -> usize {
        let mut buf = Vec::new();
        for &root in &self.roots {
            // lenient pass never fails
            let _ = self.write_node(root, &mut buf, false);
        }
        buf.len()
    }

    fn put(&mut self, atom: Atom) -> CodecResult<()> {
        if let Some(&parent) = self.parents.last() {
            let node = &self.nodes[parent];
            if node.atom == Atom::Described && node.children.len() == 2 {
                return Err(CodecError::Framing(
                    "described value already has descriptor and body".into(),
                ));
            }
        }

        let index = self.nodes.len();
        let previous = self.last;
        self.nodes.push(Node { atom, children: Vec::new() });
        match self.parents.last() {
            Some(&parent) => self.nodes[parent].children.push(index),
            None => self.roots.push(index),
        }
        self.last = Some(index);

        if let Some(limit) = self.limit {
            let size = self.encoded_len();
            if size > limit {
                match self.parents.last() {
                    Some(&parent) => {
                        self.nodes[parent].children.pop();
                    }
                    None => {
                        self.roots.pop();
                    }
                }
                self.nodes.pop();
                self.last = previous;
                return Err(CodecError::Overflow { size, limit });
            }
        }
        Ok(())
    }

    fn write_node(&self, index: usize, buf: &mut Vec<u8>, strict: bool) -> CodecResult<()> {
        let node = &self.nodes[index];
        match &node.atom {
            Atom::Ulong(0) => buf.push(constants::ULONG_ZERO),
            Atom::Ulong(v) if *v <= u8::MAX as u64 => {
                buf.extend_from_slice(&[constants::SMALL_ULONG, *v as u8])
            }
            Atom::Ulong(v) => {
                buf.push(constants::ULONG);
                buf.extend_from_slice(&v.to_be_bytes());
            }
            Atom::Symbol(s) => Self::write_variable(buf, constants::SYM8, constants::SYM32, s.as_bytes()),
            Atom::String(s) => Self::write_variable(buf, constants::STR8, constants::STR32, s.as_bytes()),
            Atom::Map => {
                if strict && node.children.len() % 2 != 0 {
                    return Err(CodecError::Framing(format!(
                        "map holds {} elements, expected key/value pairs",
                        node.children.len()
                    )));
                }
                let mut body = Vec::new();
                for &child in &node.children {
                    self.write_node(child, &mut body, strict)?;
                }
                let count = node.children.len();
                if body.len() + 1 <= u8::MAX as usize && count <= u8::MAX as usize {
                    buf.extend_from_slice(&[constants::MAP8, (body.len() + 1) as u8, count as u8]);
                } else {
                    buf.push(constants::MAP32);
                    buf.extend_from_slice(&((body.len() + 4) as u32).to_be_bytes());
                    buf.extend_from_slice(&(count as u32).to_be_bytes());
                }
                buf.extend_from_slice(&body);
            }
            Atom::Described => {
                if strict && node.children.len() != 2 {
                    return Err(CodecError::Framing(format!(
                        "described value holds {} elements, expected 2",
                        node.children.len()
                    )));
                }
                buf.push(constants::DESCRIBED);
                for &child in &node.children {
                    self.write_node(child, buf, strict)?;
                }
            }
        }
        Ok(())
    }

    fn write_variable(buf: &mut Vec<u8>, short_code: u8, long_code: u8, bytes: &[u8]) {
        if bytes.len() <= u8::MAX as usize {
            buf.extend_from_slice(&[short_code, bytes.len() as u8]);
        } else {
            buf.push(long_code);
            buf.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
        }
        buf.extend_from_slice(bytes);
    }

    fn to_value(&self, index: usize) -> CodecResult<Value> {
        let node = &self.nodes[index];
        let children = node
            .children
            .iter()
            .map(|&child| self.to_value(child))
            .collect::<CodecResult<Vec<Value>>>()?;
        match &node.atom {
            Atom::Ulong(v) => Ok(Value::Ulong(*v)),
            Atom::Symbol(s) => Ok(Value::Symbol(s.clone())),
            Atom::String(s) => Ok(Value::String(s.clone())),
            Atom::Map => {
                if children.len() % 2 != 0 {
                    return Err(CodecError::Framing("map holds an unpaired key".into()));
                }
                let mut entries = Vec::with_capacity(children.len() / 2);
                let mut iter = children.into_iter();
                while let (Some(key), Some(value)) = (iter.next(), iter.next()) {
                    entries.push((key, value));
                }
                Ok(Value::Map(entries))
            }
            Atom::Described => match <[Value; 2]>::try_from(children) {
                Ok([descriptor, body]) => Ok(Value::Described(Box::new(descriptor), Box::new(body))),
                Err(_) => Err(CodecError::Framing("incomplete described value".into())),
            },
        }
    }
}

impl Encoder for Data {
    fn put_map(&mut self) -> CodecResult<()> {
        self.put(Atom::Map)
    }

    fn put_described(&mut self) -> CodecResult<()> {
        self.put(Atom::Described)
    }

    fn put_symbol(&mut self, symbol: &str) -> CodecResult<()> {
        self.put(Atom::Symbol(symbol.to_string()))
    }

    fn put_ulong(&mut self, value: u64) -> CodecResult<()> {
        self.put(Atom::Ulong(value))
    }

    fn put_string(&mut self, value: &str) -> CodecResult<()> {
        self.put(Atom::String(value.to_string()))
    }

    fn enter(&mut self) -> CodecResult<()> {
        match self.last {
            Some(index) if self.nodes[index].atom.is_container() => {
                self.parents.push(index);
                self.last = None;
                Ok(())
            }
            Some(index) => Err(CodecError::Framing(format!(
                "cannot enter a {}",
                self.nodes[index].atom.type_name()
            ))),
            None => Err(CodecError::Framing("nothing to enter".into())),
        }
    }

    fn exit(&mut self) -> CodecResult<()> {
        match self.parents.pop() {
            Some(index) => {
                self.last = Some(index);
                Ok(())
            }
            None => Err(CodecError::Framing("exit without matching enter".into())),
        }
    }
}
