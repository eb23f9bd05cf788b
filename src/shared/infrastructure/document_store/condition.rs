// WHERE clause fragments understood by every document store adapter.
//
// Each variant renders to the SQL-like dialect of the document database. Field
// names and IN-list values are interpolated as-is and must be sanitised by the
// caller; everything else goes through named parameters.

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    In {
        field: String,
        values: Vec<String>,
    },
    NotIn {
        field: String,
        values: Vec<String>,
    },
    Equals {
        field: String,
        parameter: String,
    },
    NotEquals {
        field: String,
        parameter: String,
    },
    /// `field >= parameter`, compared chronologically for timestamps.
    AtLeast {
        field: String,
        parameter: String,
    },
    /// Field absent from the document. Absent and null are distinct in the store.
    Undefined {
        field: String,
    },
    /// Field absent or explicitly null.
    Missing {
        field: String,
    },
    /// Field present and not null.
    Present {
        field: String,
    },
    /// Any of the fields falls inside `[low, high]`.
    AnyBetween {
        fields: Vec<String>,
        low: String,
        high: String,
    },
    /// Stored `[start_field, end_field]` overlaps the candidate `[start, end]`, touching
    /// boundaries excluded. With `open_end` set, a stored document without an end is
    /// treated as ending at that parameter; without it such documents never match.
    RangeOverlap {
        start_field: String,
        end_field: String,
        start: String,
        end: String,
        open_end: Option<String>,
    },
    /// Any of the nested conditions holds.
    AnyOf(Vec<Condition>),
}

impl Condition {
    pub fn render(&self, alias: &str) -> String {
        match self {
            Condition::In { field, values } => {
                format!("{alias}.{field} IN {}", tuple_string(values))
            }
            Condition::NotIn { field, values } => {
                format!("{alias}.{field} NOT IN {}", tuple_string(values))
            }
            Condition::Equals { field, parameter } => format!("{alias}.{field} = {parameter}"),
            Condition::NotEquals { field, parameter } => {
                format!("{alias}.{field} != {parameter}")
            }
            Condition::AtLeast { field, parameter } => {
                format!("{alias}.{field} >= {parameter}")
            }
            Condition::Undefined { field } => format!("NOT IS_DEFINED({alias}.{field})"),
            Condition::Missing { field } => {
                format!("(NOT IS_DEFINED({alias}.{field}) OR IS_NULL({alias}.{field}))")
            }
            Condition::Present { field } => {
                format!("(IS_DEFINED({alias}.{field}) AND NOT IS_NULL({alias}.{field}))")
            }
            Condition::AnyBetween { fields, low, high } => {
                let ranges: Vec<String> = fields
                    .iter()
                    .map(|field| format!("({alias}.{field} BETWEEN {low} AND {high})"))
                    .collect();
                format!("({})", ranges.join(" OR "))
            }
            Condition::RangeOverlap {
                start_field,
                end_field,
                start,
                end,
                open_end,
            } => {
                let stored_start = format!("{alias}.{start_field}");
                let stored_end = match open_end {
                    Some(now) => format!(
                        "(IS_STRING({alias}.{end_field}) ? {alias}.{end_field} : {now})"
                    ),
                    None => format!("{alias}.{end_field}"),
                };
                let guard = match open_end {
                    Some(_) => String::new(),
                    None => format!("IS_STRING({alias}.{end_field}) AND "),
                };
                format!(
                    "({guard}(({stored_start} BETWEEN {start} AND {end}) \
                     OR ({stored_end} BETWEEN {start} AND {end}) \
                     OR ({start} BETWEEN {stored_start} AND {stored_end}) \
                     OR ({end} BETWEEN {stored_start} AND {stored_end})) \
                     AND {stored_start} != {end} \
                     AND {stored_end} != {start})"
                )
            }
            Condition::AnyOf(conditions) => {
                let rendered: Vec<String> = conditions
                    .iter()
                    .map(|condition| condition.render(alias))
                    .collect();
                format!("({})", rendered.join(" OR "))
            }
        }
    }
}

fn tuple_string(values: &[String]) -> String {
    let quoted: Vec<String> = values.iter().map(|value| format!("'{value}'")).collect();
    format!("({})", quoted.join(", "))
}
