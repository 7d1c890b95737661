//! Per-object staging buffers for borrowed query results.
//!
//! Query operations that hand out strings, arrays, or shapes write into the
//! buffers of the object they were called on and return a borrow. The borrow
//! is valid until the next query on the same object; the borrow checker
//! enforces what the foreign-call convention can only document.

/// Result staging area. Every handle (and the bridge itself, for global
/// queries) owns one.
#[derive(Debug, Default)]
pub struct ReturnBuffers {
    /// Last string result.
    pub ret_str: String,
    /// Last string-list result.
    pub ret_strings: Vec<String>,
    /// Last float-array result.
    pub ret_floats: Vec<f32>,
    /// Last unsigned-array result.
    pub ret_uints: Vec<u32>,
    /// Shape of the last array result.
    pub ret_shape: Vec<u64>,
    /// Last raw-bytes result.
    pub ret_bytes: Vec<u8>,
}

impl ReturnBuffers {
    /// Stage a string and return the stored copy.
    pub fn stage_str(&mut self, value: impl Into<String>) -> &str {
        self.ret_str = value.into();
        &self.ret_str
    }

    /// Stage a list of strings and return the stored slice.
    pub fn stage_strings<I, S>(&mut self, values: I) -> &[String]
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ret_strings.clear();
        self.ret_strings.extend(values.into_iter().map(Into::into));
        &self.ret_strings
    }

    /// Stage a float array and return the stored slice.
    pub fn stage_floats(&mut self, values: Vec<f32>) -> &[f32] {
        self.ret_floats = values;
        &self.ret_floats
    }

    /// Stage an unsigned array and return the stored slice.
    pub fn stage_uints(&mut self, values: Vec<u32>) -> &[u32] {
        self.ret_uints = values;
        &self.ret_uints
    }
}
