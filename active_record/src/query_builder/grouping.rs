/// Represents a GROUP BY clause
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupBy {
    /// Fields to group by, in call order
    pub fields: Vec<String>,
}

impl GroupBy {
    /// Create a new GROUP BY clause with the specified fields
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    /// Append a grouping field
    pub fn push(&mut self, field: impl Into<String>) {
        self.fields.push(field.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn to_sql(&self) -> String {
        if self.fields.is_empty() {
            String::new()
        } else {
            format!("GROUP BY {}", self.fields.join(", "))
        }
    }
}
