use std::fmt;

use crate::process::Value;

pub const FIELD_COUNT: usize = 7;

/// The fixed output columns, in output order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CanonicalField {
    EmployeeId,
    FirstName,
    LastName,
    Email,
    JobTitle,
    PhoneNumber,
    HireDate,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; FIELD_COUNT] = [
        CanonicalField::EmployeeId,
        CanonicalField::FirstName,
        CanonicalField::LastName,
        CanonicalField::Email,
        CanonicalField::JobTitle,
        CanonicalField::PhoneNumber,
        CanonicalField::HireDate,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CanonicalField::EmployeeId => "Employee ID",
            CanonicalField::FirstName => "First Name",
            CanonicalField::LastName => "Last Name",
            CanonicalField::Email => "Email",
            CanonicalField::JobTitle => "Job Title",
            CanonicalField::PhoneNumber => "Phone Number",
            CanonicalField::HireDate => "Hire Date",
        }
    }

    /// Tag an XML source uses for this field: lowercase with spaces removed.
    pub fn xml_tag(&self) -> String {
        self.name().replace(' ', "").to_lowercase()
    }

    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One employee row, one value per canonical field.
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeRecord([Value; FIELD_COUNT]);

impl EmployeeRecord {
    pub fn new(values: [Value; FIELD_COUNT]) -> Self {
        Self(values)
    }

    pub fn from_fn(mut f: impl FnMut(CanonicalField) -> Value) -> Self {
        Self(std::array::from_fn(|i| f(CanonicalField::ALL[i])))
    }

    pub fn get(&self, field: CanonicalField) -> &Value {
        &self.0[field.index()]
    }

    pub fn values(&self) -> &[Value; FIELD_COUNT] {
        &self.0
    }
}

impl fmt::Display for EmployeeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in CanonicalField::ALL.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", field, self.0[i])?;
        }
        Ok(())
    }
}

/// The normalized output of preprocessing. Always renders the seven canonical
/// columns in `CanonicalField::ALL` order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalTable {
    records: Vec<EmployeeRecord>,
}

impl CanonicalTable {
    pub fn new(records: Vec<EmployeeRecord>) -> Self {
        Self { records }
    }

    pub fn columns() -> [&'static str; FIELD_COUNT] {
        CanonicalField::ALL.map(|f| f.name())
    }

    pub fn records(&self) -> &[EmployeeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Values of one column, top to bottom.
    pub fn column(&self, field: CanonicalField) -> impl Iterator<Item = &Value> + '_ {
        self.records.iter().map(move |r| r.get(field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_are_in_output_order() {
        assert_eq!(
            CanonicalTable::columns(),
            [
                "Employee ID",
                "First Name",
                "Last Name",
                "Email",
                "Job Title",
                "Phone Number",
                "Hire Date"
            ]
        );
    }

    #[test]
    fn test_xml_tags() {
        assert_eq!(CanonicalField::EmployeeId.xml_tag(), "employeeid");
        assert_eq!(CanonicalField::HireDate.xml_tag(), "hiredate");
        assert_eq!(CanonicalField::Email.xml_tag(), "email");
    }

    #[test]
    fn test_record_lookup_by_field() {
        let rec = EmployeeRecord::from_fn(|f| Value::Text(f.name().to_lowercase()));
        assert_eq!(rec.get(CanonicalField::JobTitle), &Value::Text("job title".into()));
        assert_eq!(CanonicalField::PhoneNumber.index(), 5);
    }
}
