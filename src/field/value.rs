#[derive(Debug, Clone)]
pub enum FieldValue {
    String(String),
    Int(i64),
    Float(f64),
    Unsigned(u64),
    Boolean(bool),
    Null,
}

impl From<i32> for FieldValue {
    #[inline(always)]
    fn from(i: i32) -> Self {
        Self::Int(i as i64)
    }
}

impl From<Option<i32>> for FieldValue {
    #[inline(always)]
    fn from(option: Option<i32>) -> Self {
        match option {
            Some(i) => Self::from(i),
            None => Self::Null,
        }
    }
}

impl From<i64> for FieldValue {
    #[inline(always)]
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<u32> for FieldValue {
    #[inline(always)]
    fn from(u: u32) -> Self {
        Self::Unsigned(u as u64)
    }
}

impl From<u64> for FieldValue {
    #[inline(always)]
    fn from(u: u64) -> Self {
        Self::Unsigned(u)
    }
}

impl From<f64> for FieldValue {
    #[inline(always)]
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for FieldValue {
    #[inline(always)]
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<String> for FieldValue {
    #[inline(always)]
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for FieldValue {
    #[inline(always)]
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

#[cfg(feature = "serde_json")]
impl TryFrom<serde_json::Value> for FieldValue {
    type Error = crate::error::JSONError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::String(s) => Ok(Self::String(s)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Self::Int(i))
                } else if let Some(u) = n.as_u64() {
                    Ok(Self::Unsigned(u))
                } else if let Some(f) = n.as_f64() {
                    Ok(Self::Float(f))
                } else {
                    Err(Self::Error::InvalidFieldValue(n.to_string()))
                }
            }
            serde_json::Value::Bool(b) => Ok(Self::Boolean(b)),
            serde_json::Value::Null => Ok(Self::Null),
            _ => Err(Self::Error::InvalidFieldValue(format!("{:?}", value))),
        }
    }
}

impl PartialEq for FieldValue {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::String(a), Self::String(b)) => a.eq(b),
            (Self::Int(a), Self::Int(b)) => a.eq(b),
            (Self::Unsigned(a), Self::Unsigned(b)) => a.eq(b),
            (Self::Float(a), Self::Float(b)) => a.eq(b),
            (Self::Boolean(a), Self::Boolean(b)) => a.eq(b),
            (Self::Null, Self::Null) => true,
            _ => false,
        }
    }
}

impl FieldValue {
    #[inline(always)]
    pub(crate) fn value_to_string(&self) -> String {
        match self {
            Self::String(s) => s.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Unsigned(u) => u.to_string(),
            Self::Boolean(b) => b.to_string(),
            Self::Null => "null".to_string(),
        }
    }

    /// Render the value the way it is written in a query
    pub(crate) fn to_literal(&self) -> String {
        match self {
            Self::String(s) => format!("{:?}", s),
            _ => self.value_to_string(),
        }
    }

    #[inline(always)]
    pub(crate) fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}
