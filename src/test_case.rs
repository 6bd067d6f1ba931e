use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::ops::Deref;
use std::path::Path;

use csv::StringRecord;
use serde::{Deserialize, Serialize};

use crate::error::LoadError;

/// One row of a fixture table: a request to synthesize and what the handler should answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TestCase {
    pub name: String,
    pub request_body: String,
    pub http_verb: String,
    pub uri: String,
    pub want_status_code: u16,
    pub want_response_body: String,
    pub skip: bool,
}

/// Test cases in file row order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestCases(Vec<TestCase>);

/// A column a fixture table may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    RequestBody,
    HttpVerb,
    Uri,
    WantStatusCode,
    WantResponseBody,
    Skip,
}

impl Field {
    /// Every field, in the positional order used by tables without a header.
    pub const ALL: [Field; 7] = [
        Field::Name,
        Field::RequestBody,
        Field::HttpVerb,
        Field::Uri,
        Field::WantStatusCode,
        Field::WantResponseBody,
        Field::Skip,
    ];

    pub fn header(self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::RequestBody => "RequestBody",
            Field::HttpVerb => "HttpVerb",
            Field::Uri => "Uri",
            Field::WantStatusCode => "WantStatusCode",
            Field::WantResponseBody => "WantResponseBody",
            Field::Skip => "Skip",
        }
    }

    /// Case-sensitive lookup of a header cell.
    pub fn from_header(cell: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.header() == cell)
    }
}

/// Where each recognized field lives in a row. Built once per table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap(HashMap<Field, usize>);

impl ColumnMap {
    pub fn positional() -> Self {
        Self(Field::ALL.into_iter().enumerate().map(|(i, f)| (f, i)).collect())
    }

    /// Unrecognized header cells are ignored. A field named twice keeps its last column.
    pub fn from_header(header: &StringRecord) -> Self {
        Self(
            header
                .iter()
                .enumerate()
                .filter_map(|(i, cell)| Field::from_header(cell).map(|f| (f, i)))
                .collect(),
        )
    }

    pub fn index(&self, field: Field) -> Option<usize> {
        self.0.get(&field).copied()
    }

    /// Missing columns and cells past the end of the row read as empty.
    pub fn cell<'r>(&self, row: &'r StringRecord, field: Field) -> &'r str {
        self.index(field).and_then(|i| row.get(i)).unwrap_or("")
    }
}

impl TestCase {
    /// Builds a case from one data row.
    ///
    /// Returns `Ok(None)` for a blank separator row.
    fn from_row(row: usize, record: &StringRecord, columns: &ColumnMap) -> Result<Option<Self>, LoadError> {
        let cell = |field| columns.cell(record, field);

        if Field::ALL.into_iter().all(|field| cell(field).is_empty()) {
            return Ok(None);
        }

        let mandatory = [Field::Name, Field::HttpVerb, Field::Uri, Field::WantStatusCode];
        if mandatory.into_iter().any(|field| cell(field).is_empty()) {
            return Err(LoadError::Validation {
                row,
                name: cell(Field::Name).to_string(),
            });
        }

        Ok(Some(Self {
            name: cell(Field::Name).to_string(),
            request_body: cell(Field::RequestBody).to_string(),
            http_verb: cell(Field::HttpVerb).to_string(),
            uri: cell(Field::Uri).to_string(),
            want_status_code: parse_status_code(row, cell(Field::WantStatusCode))?,
            want_response_body: cell(Field::WantResponseBody).to_string(),
            skip: parse_skip(cell(Field::Skip)),
        }))
    }
}

impl TestCases {
    /// Loads the fixture table at `path`.
    ///
    /// With `has_header` the first row names the columns, otherwise columns follow
    /// [`Field::ALL`]. Lines starting with `#` are comments.
    pub fn load(path: impl AsRef<Path>, delimiter: u8, has_header: bool) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_reader(file, delimiter, has_header)
    }

    pub fn from_reader<R: Read>(reader: R, delimiter: u8, has_header: bool) -> Result<Self, LoadError> {
        let mut rows = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .comment(Some(b'#'))
            .has_headers(false)
            .from_reader(reader)
            .into_records()
            .enumerate();

        let columns = if has_header {
            match rows.next() {
                Some((_, header)) => ColumnMap::from_header(&header?),
                None => return Ok(Self::default()),
            }
        } else {
            ColumnMap::positional()
        };
        log::debug!("resolved columns: {columns:?}");

        let mut cases = Vec::new();
        for (row, record) in rows {
            if let Some(case) = TestCase::from_row(row, &record?, &columns)? {
                cases.push(case);
            }
        }

        log::debug!("loaded {} test cases", cases.len());
        Ok(Self(cases))
    }

    pub fn into_inner(self) -> Vec<TestCase> {
        self.0
    }
}

impl Deref for TestCases {
    type Target = [TestCase];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<TestCase>> for TestCases {
    fn from(cases: Vec<TestCase>) -> Self {
        Self(cases)
    }
}

impl IntoIterator for TestCases {
    type Item = TestCase;
    type IntoIter = std::vec::IntoIter<TestCase>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a TestCases {
    type Item = &'a TestCase;
    type IntoIter = std::slice::Iter<'a, TestCase>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// "200 OK" and "400 Bad Request" carry the code in their first three characters.
fn parse_status_code(row: usize, value: &str) -> Result<u16, LoadError> {
    value
        .get(..3)
        .filter(|code| code.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|code| code.parse().ok())
        .ok_or_else(|| LoadError::StatusCode {
            row,
            value: value.to_string(),
        })
}

fn parse_skip(value: &str) -> bool {
    matches!(value.to_ascii_uppercase().as_str(), "YES" | "TRUE" | "1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn load(table: &str, has_header: bool) -> Result<TestCases, LoadError> {
        TestCases::from_reader(table.as_bytes(), b',', has_header)
    }

    #[test]
    fn header_resolves_columns_in_any_order() {
        let table = r##"Uri,Name,Extra,WantStatusCode,HttpVerb,WantResponseBody,Skip,RequestBody
/user/1,Get user,ignored,200 OK,GET,"{""id"":1}",no,
/user,Create user,,201,POST,,,"{""name"":""Bob""}"
"##;
        let cases = load(table, true).unwrap();

        assert_eq!(
            cases.to_vec(),
            vec![
                TestCase {
                    name: "Get user".into(),
                    request_body: "".into(),
                    http_verb: "GET".into(),
                    uri: "/user/1".into(),
                    want_status_code: 200,
                    want_response_body: r#"{"id":1}"#.into(),
                    skip: false,
                },
                TestCase {
                    name: "Create user".into(),
                    request_body: r#"{"name":"Bob"}"#.into(),
                    http_verb: "POST".into(),
                    uri: "/user".into(),
                    want_status_code: 201,
                    want_response_body: "".into(),
                    skip: false,
                },
            ]
        );
    }

    #[test]
    fn positional_columns_without_header() {
        let table = "Delete user,,DELETE,/user/7,204 No Content,,YES\n";
        let cases = load(table, false).unwrap();

        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].name, "Delete user");
        assert_eq!(cases[0].http_verb, "DELETE");
        assert_eq!(cases[0].uri, "/user/7");
        assert_eq!(cases[0].want_status_code, 204);
        assert!(cases[0].skip);
    }

    #[test]
    fn header_cells_are_case_sensitive() {
        let table = "name,HttpVerb,Uri,WantStatusCode\nGet user,GET,/,200\n";
        let err = load(table, true).unwrap_err();

        assert!(matches!(err, LoadError::Validation { row: 1, ref name } if name.is_empty()));
    }

    #[test]
    fn blank_and_comment_rows_are_dropped() {
        let table = "\
# fixture table for the user api
Name,HttpVerb,Uri,WantStatusCode
A,GET,/a,200
,,,
# disabled: B,GET,/b,200

C,GET,/c,200
";
        let cases = load(table, true).unwrap();
        let names: Vec<_> = cases.iter().map(|c| c.name.as_str()).collect();

        assert_eq!(names, ["A", "C"]);
    }

    #[test]
    fn fully_blank_positional_row_is_dropped() {
        let table = "A,,GET,/a,200,,\n,,,,,,\n";
        assert_eq!(load(table, false).unwrap().len(), 1);
    }

    #[test]
    fn missing_mandatory_field_fails_whole_load() {
        let table = "Name,HttpVerb,Uri,WantStatusCode\nA,GET,/a,200\nB,,/b,200\nC,GET,/c,200\n";
        let err = load(table, true).unwrap_err();

        match err {
            LoadError::Validation { row, name } => {
                assert_eq!(row, 2);
                assert_eq!(name, "B");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_name_reports_empty_name() {
        let table = ",,GET,/a,200,,\n";
        let err = load(table, false).unwrap_err();

        assert_eq!(err.to_string(), "missing mandatory information in row 0 ()");
    }

    #[test]
    fn status_code_tolerates_trailing_text() {
        assert_eq!(parse_status_code(0, "200 OK").unwrap(), 200);
        assert_eq!(parse_status_code(0, "404").unwrap(), 404);
        assert_eq!(parse_status_code(0, "400 Bad Request").unwrap(), 400);
    }

    #[test]
    fn status_code_needs_three_leading_digits() {
        for value in ["4xx", "20", "OK 200", "+20", "2é0"] {
            assert!(
                matches!(parse_status_code(3, value), Err(LoadError::StatusCode { row: 3, .. })),
                "{value} should not parse"
            );
        }
    }

    #[test]
    fn unparsable_status_code_fails_whole_load() {
        let table = "A,,GET,/a,200,,\nB,,GET,/b,4xx,,\n";
        assert!(matches!(load(table, false), Err(LoadError::StatusCode { row: 1, .. })));
    }

    #[test]
    fn skip_is_case_insensitive() {
        for value in ["yes", "YES", "Yes", "true", "TRUE", "1"] {
            assert!(parse_skip(value), "{value}");
        }
        for value in ["no", "false", "0", "", "skip", "y"] {
            assert!(!parse_skip(value), "{value}");
        }
    }

    #[test]
    fn custom_delimiter() {
        let table = "Name;HttpVerb;Uri;WantStatusCode\nA, with comma;GET;/a;200\n";
        let cases = TestCases::from_reader(table.as_bytes(), b';', true).unwrap();

        assert_eq!(cases[0].name, "A, with comma");
    }

    #[test]
    fn ragged_rows_are_malformed() {
        let table = "Name,HttpVerb,Uri,WantStatusCode\nA,GET,/a\n";
        assert!(matches!(load(table, true), Err(LoadError::Csv(_))));
    }

    #[test]
    fn header_only_table_is_empty() {
        assert!(load("Name,HttpVerb,Uri,WantStatusCode\n", true).unwrap().is_empty());
        assert!(load("", true).unwrap().is_empty());
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cases.tsv");
        std::fs::write(&path, "Ping\t\tGET\t/ping\t200\t\t\n").unwrap();

        let cases = TestCases::load(&path, b'\t', false).unwrap();
        assert_eq!(cases[0].uri, "/ping");
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = TestCases::load(dir.path().join("nope.csv"), b',', true).unwrap_err();

        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn column_map_positional_order() {
        let columns = ColumnMap::positional();
        for (i, field) in Field::ALL.into_iter().enumerate() {
            assert_eq!(columns.index(field), Some(i));
        }
    }
}
