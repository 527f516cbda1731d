//! Parser for CDL, the text form of a NetCDF file printed by `ncdump`.
//!
//! Only the classic data model is supported: dimensions, numeric and char
//! variables, attributes and the data section. Char and string variables
//! are skipped. Fill markers (`_`) become NaN and CF packing attributes are
//! decoded, so the result matches what the native reader produces.

use tracing::debug;

use crate::dataset::{unpack, Attribute, AttributeValue, Dataset, Dimension, Variable};
use crate::error::{NetCdfError, NetCdfResult};

const NUMERIC_TYPES: &[&str] = &[
    "byte", "ubyte", "short", "ushort", "int", "uint", "long", "int64", "uint64", "float", "real",
    "double",
];
const TEXT_TYPES: &[&str] = &["char", "string"];
const TYPE_SUFFIXES: &[char] = &['f', 'F', 'd', 'D', 'l', 'L', 's', 'S', 'b', 'B', 'u', 'U'];

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Header,
    Dimensions,
    Variables,
    Data,
}

struct Declared {
    name: String,
    dims: Vec<String>,
    numeric: bool,
    attributes: Vec<Attribute>,
    data: Option<Vec<f64>>,
}

/// Parse a complete CDL document into a [`Dataset`].
///
/// A header-only document (`ncdump -h`) yields variables with empty data.
pub fn parse_cdl(text: &str) -> NetCdfResult<Dataset> {
    let mut section = Section::Header;
    let mut dimensions: Vec<Dimension> = Vec::new();
    let mut declared: Vec<Declared> = Vec::new();
    let mut global_attributes: Vec<Attribute> = Vec::new();
    let mut pending = String::new();
    let mut pending_start = 0;
    let mut scanner = StatementScanner::default();

    for (index, raw_line) in text.lines().enumerate() {
        let line_no = index + 1;
        let (code, comment) = split_comment(raw_line);
        let trimmed = code.trim();

        if pending.trim().is_empty() {
            match trimmed {
                "dimensions:" => {
                    section = Section::Dimensions;
                    continue;
                }
                "variables:" => {
                    section = Section::Variables;
                    continue;
                }
                "data:" => {
                    section = Section::Data;
                    continue;
                }
                "}" | "" => continue,
                _ if trimmed.starts_with("netcdf ") => continue,
                _ if trimmed.starts_with("group:") => {
                    return Err(parse_error(line_no, "netCDF-4 groups are not supported"));
                }
                _ => pending_start = line_no,
            }
        }

        pending.push_str(code);
        pending.push('\n');

        while let Some(end) = scanner.next_end(&pending) {
            let statement: String = pending[..end].trim().to_string();
            pending.drain(..=end);
            if statement.is_empty() {
                continue;
            }
            match section {
                Section::Dimensions => {
                    parse_dimensions(&statement, comment, pending_start, &mut dimensions)?
                }
                Section::Variables => parse_variable_statement(
                    &statement,
                    pending_start,
                    &mut declared,
                    &mut global_attributes,
                )?,
                Section::Data => parse_data(&statement, pending_start, &mut declared)?,
                Section::Header => {
                    return Err(parse_error(pending_start, "statement outside of any section"))
                }
            }
            pending_start = line_no;
        }
    }

    if !pending.trim().is_empty() && pending.trim() != "}" {
        return Err(parse_error(pending_start, "unterminated statement"));
    }

    build_dataset(dimensions, declared, global_attributes)
}

fn build_dataset(
    mut dimensions: Vec<Dimension>,
    declared: Vec<Declared>,
    attributes: Vec<Attribute>,
) -> NetCdfResult<Dataset> {
    // UNLIMITED dimensions without a "(N currently)" note take their length from the data.
    for dim in dimensions.iter_mut().filter(|d| d.unlimited && d.len == 0) {
        if let Some(len) = infer_unlimited_len(&dim.name, &declared, &[]) {
            dim.len = len;
        }
    }
    let fixed = dimensions.clone();
    for dim in dimensions.iter_mut().filter(|d| d.unlimited && d.len == 0) {
        if let Some(len) = infer_unlimited_len(&dim.name, &declared, &fixed) {
            dim.len = len;
        }
    }

    let mut dataset = Dataset {
        dimensions,
        variables: Vec::new(),
        attributes,
    };

    for var in declared {
        if !var.numeric {
            debug!(variable = %var.name, "Skipping non-numeric variable");
            continue;
        }
        let shape: Vec<usize> = var
            .dims
            .iter()
            .map(|d| {
                dataset
                    .dimension(d)
                    .map(|dim| dim.len)
                    .ok_or_else(|| NetCdfError::MissingData(format!("dimension {} of {}", d, var.name)))
            })
            .collect::<NetCdfResult<_>>()?;

        let expected: usize = shape.iter().product();
        let mut data = var.data.unwrap_or_default();
        if !data.is_empty() && data.len() != expected {
            return Err(NetCdfError::InvalidFormat(format!(
                "variable {} has {} values, dimensions {:?} require {}",
                var.name,
                data.len(),
                shape,
                expected
            )));
        }
        unpack(&mut data, &var.attributes);

        dataset.variables.push(Variable {
            name: var.name,
            dims: var.dims,
            shape,
            attributes: var.attributes,
            data,
        });
    }

    Ok(dataset)
}

fn infer_unlimited_len(name: &str, declared: &[Declared], known: &[Dimension]) -> Option<usize> {
    declared.iter().find_map(|var| {
        let data = var.data.as_ref()?;
        if var.dims.first().map(String::as_str) != Some(name) {
            return None;
        }
        let rest: Option<usize> = var.dims[1..]
            .iter()
            .map(|d| known.iter().find(|k| &k.name == d && k.len > 0).map(|k| k.len))
            .product();
        match (var.dims.len(), rest) {
            (1, _) => Some(data.len()),
            (_, Some(rest)) if rest > 0 => Some(data.len() / rest),
            _ => None,
        }
    })
}

fn parse_dimensions(
    statement: &str,
    comment: Option<&str>,
    line: usize,
    dimensions: &mut Vec<Dimension>,
) -> NetCdfResult<()> {
    for part in statement.split(',') {
        let (name, value) = part
            .split_once('=')
            .ok_or_else(|| parse_error(line, format!("expected `name = length`, got `{}`", part.trim())))?;
        let name = name.trim().to_string();
        let value = value.trim();

        let (len, unlimited) = if value.eq_ignore_ascii_case("UNLIMITED") {
            (comment.and_then(currently_len).unwrap_or(0), true)
        } else {
            let len = value
                .parse::<usize>()
                .map_err(|_| parse_error(line, format!("invalid length for dimension {}", name)))?;
            (len, false)
        };

        dimensions.push(Dimension {
            name,
            len,
            unlimited,
        });
    }
    Ok(())
}

/// Extract `N` from an ncdump comment like `// (9 currently)`.
fn currently_len(comment: &str) -> Option<usize> {
    let start = comment.find('(')? + 1;
    let rest = &comment[start..];
    let end = rest.find(" currently")?;
    rest[..end].trim().parse().ok()
}

fn parse_variable_statement(
    statement: &str,
    line: usize,
    declared: &mut Vec<Declared>,
    globals: &mut Vec<Attribute>,
) -> NetCdfResult<()> {
    let (head, value) = match statement.split_once('=') {
        Some((head, value)) => (head.trim(), Some(value.trim())),
        None => (statement.trim(), None),
    };

    // Attribute: `var:name = value`, `:name = value`, or typed `string var:name = value`
    if let Some(value) = value {
        let target = strip_type_keyword(head);
        let (var_name, attr_name) = target
            .split_once(':')
            .ok_or_else(|| parse_error(line, format!("expected an attribute, got `{}`", head)))?;
        let attribute = Attribute {
            name: attr_name.trim().to_string(),
            value: parse_attribute_value(value, line)?,
        };
        let var_name = var_name.trim();
        if var_name.is_empty() {
            globals.push(attribute);
        } else {
            let var = declared
                .iter_mut()
                .find(|v| v.name == var_name)
                .ok_or_else(|| parse_error(line, format!("attribute for undeclared variable {}", var_name)))?;
            var.attributes.push(attribute);
        }
        return Ok(());
    }

    // Declaration: `float uo(time, depth, latitude, longitude)` or `int crs`
    let (type_name, rest) = head
        .split_once(char::is_whitespace)
        .ok_or_else(|| parse_error(line, format!("expected a declaration, got `{}`", head)))?;
    let numeric = if NUMERIC_TYPES.contains(&type_name) {
        true
    } else if TEXT_TYPES.contains(&type_name) {
        false
    } else {
        return Err(parse_error(line, format!("unknown type `{}`", type_name)));
    };

    let rest = rest.trim();
    let (name, dims) = match rest.split_once('(') {
        Some((name, dims)) => {
            let dims = dims
                .trim()
                .strip_suffix(')')
                .ok_or_else(|| parse_error(line, "missing `)` in declaration"))?;
            let dims: Vec<String> = dims
                .split(',')
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty())
                .collect();
            (name.trim().to_string(), dims)
        }
        None => (rest.to_string(), Vec::new()),
    };

    declared.push(Declared {
        name,
        dims,
        numeric,
        attributes: Vec::new(),
        data: None,
    });
    Ok(())
}

fn strip_type_keyword(head: &str) -> &str {
    match head.split_once(char::is_whitespace) {
        Some((first, rest)) if NUMERIC_TYPES.contains(&first) || TEXT_TYPES.contains(&first) => rest.trim(),
        _ => head,
    }
}

fn parse_data(statement: &str, line: usize, declared: &mut [Declared]) -> NetCdfResult<()> {
    let (name, values) = statement
        .split_once('=')
        .ok_or_else(|| parse_error(line, format!("expected `name = values`, got `{}`", statement)))?;
    let name = name.trim();
    let var = declared
        .iter_mut()
        .find(|v| v.name == name)
        .ok_or_else(|| parse_error(line, format!("data for undeclared variable {}", name)))?;

    if !var.numeric {
        return Ok(());
    }

    let data = split_values(values)
        .into_iter()
        .map(|token| parse_number(&token).ok_or_else(|| parse_error(line, format!("invalid value `{}` for {}", token, name))))
        .collect::<NetCdfResult<Vec<f64>>>()?;
    var.data = Some(data);
    Ok(())
}

fn parse_attribute_value(value: &str, line: usize) -> NetCdfResult<AttributeValue> {
    if value.starts_with('"') {
        let mut text = String::new();
        for token in split_values(value) {
            text.push_str(&unquote(&token));
        }
        return Ok(AttributeValue::Text(text));
    }

    let numbers = split_values(value)
        .into_iter()
        .map(|token| parse_number(&token).ok_or_else(|| parse_error(line, format!("invalid attribute value `{}`", token))))
        .collect::<NetCdfResult<Vec<f64>>>()?;
    Ok(AttributeValue::Numbers(numbers))
}

/// Split a comma separated value list, keeping quoted strings intact.
fn split_values(values: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;

    for c in values.chars() {
        if in_quotes {
            current.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_quotes = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_quotes = true;
                current.push(c);
            }
            ',' => {
                tokens.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        tokens.push(current.trim().to_string());
    }
    tokens.retain(|t| !t.is_empty());
    tokens
}

fn unquote(token: &str) -> String {
    let inner = token
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(token);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Parse one CDL numeric literal, e.g. `1.5f`, `-3s`, `NaNf`, `_` (fill).
fn parse_number(token: &str) -> Option<f64> {
    let token = token.trim();
    if token == "_" {
        return Some(f64::NAN);
    }

    let lower = token.to_ascii_lowercase();
    let special = lower.strip_suffix('f').unwrap_or(&lower);
    match special {
        "nan" => return Some(f64::NAN),
        "inf" | "infinity" | "+inf" | "+infinity" => return Some(f64::INFINITY),
        "-inf" | "-infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }

    let digits = token.trim_end_matches(TYPE_SUFFIXES);
    digits.parse::<f64>().ok()
}

/// Byte offset of the first `;` outside a quoted string.
/// Finds `;` terminators outside quoted strings.
///
/// Scanning resumes where the previous call stopped, so a statement spread
/// over many lines is scanned once in total. The caller drains the buffer
/// up to and including each returned terminator.
#[derive(Debug, Default)]
struct StatementScanner {
    scanned: usize,
    in_quotes: bool,
    escaped: bool,
}

impl StatementScanner {
    fn next_end(&mut self, text: &str) -> Option<usize> {
        let start = self.scanned;
        for (offset, c) in text[start..].char_indices() {
            if self.in_quotes {
                if self.escaped {
                    self.escaped = false;
                } else if c == '\\' {
                    self.escaped = true;
                } else if c == '"' {
                    self.in_quotes = false;
                }
                continue;
            }
            match c {
                '"' => self.in_quotes = true,
                ';' => {
                    *self = Self::default();
                    return Some(start + offset);
                }
                _ => {}
            }
        }
        self.scanned = text.len();
        None
    }
}

/// Split a line into code and an optional `//` comment outside quotes.
fn split_comment(line: &str) -> (&str, Option<&str>) {
    let mut in_quotes = false;
    let mut escaped = false;
    let bytes = line.as_bytes();
    for (i, c) in line.char_indices() {
        if in_quotes {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_quotes = false;
            }
            continue;
        }
        if c == '"' {
            in_quotes = true;
        } else if c == '/' && bytes.get(i + 1) == Some(&b'/') {
            return (&line[..i], Some(&line[i + 2..]));
        }
    }
    (line, None)
}

fn parse_error(line: usize, message: impl Into<String>) -> NetCdfError {
    NetCdfError::Parse {
        line,
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CURRENTS: &str = r#"netcdf cmems_currents {
dimensions:
	time = UNLIMITED ; // (2 currently)
	depth = 1 ;
	latitude = 3 ;
	longitude = 2 ;
variables:
	float uo(time, depth, latitude, longitude) ;
		uo:_FillValue = NaNf ;
		uo:units = "m s-1" ;
		uo:long_name = "Eastward velocity" ;
	short thetao(time, depth, latitude, longitude) ;
		thetao:_FillValue = -32767s ;
		thetao:scale_factor = 0.001 ;
		thetao:add_offset = 20. ;
	double time(time) ;
		time:units = "hours since 1950-01-01" ;
	float depth(depth) ;
	float latitude(latitude) ;
	float longitude(longitude) ;
	char crs ;

// global attributes:
		:Conventions = "CF-1.6" ;
		:history = "created;\n",
			"subset" ;
data:

 uo =
  0.1, 0.2,
  _, 0.4,
  0.5, 0.6,
  1.1, 1.2,
  1.3, NaNf,
  1.5, 1.6 ;

 thetao = 1000s, -32767s, 0s, 0s, 0s, 0s, 0s, 0s, 0s, 0s, 0s, 2000s ;

 time = 648000, 648006 ;

 depth = 0.494f ;

 latitude = 40, 39, 38 ;

 longitude = 118.f, 118.5f ;

 crs = "" ;
}
"#;

    #[test]
    fn test_parse_dimensions() {
        let ds = parse_cdl(CURRENTS).unwrap();
        let time = ds.dimension("time").unwrap();
        assert_eq!(time.len, 2);
        assert!(time.unlimited);
        assert_eq!(ds.dimension("latitude").unwrap().len, 3);
        assert_eq!(ds.dimension_names(), vec!["time", "depth", "latitude", "longitude"]);
    }

    #[test]
    fn test_parse_variables_and_fill() {
        let ds = parse_cdl(CURRENTS).unwrap();
        let uo = ds.variable("uo").unwrap();
        assert_eq!(uo.shape, vec![2, 1, 3, 2]);
        assert_eq!(uo.data.len(), 12);
        assert!((uo.data[0] - 0.1).abs() < 1e-6);
        assert!(uo.data[2].is_nan());
        assert!(uo.data[9].is_nan());
        assert_eq!(uo.text_attribute("units"), Some("m s-1"));
        assert!(ds.variable("crs").is_none());
    }

    #[test]
    fn test_packed_values_are_decoded() {
        let ds = parse_cdl(CURRENTS).unwrap();
        let thetao = ds.variable("thetao").unwrap();
        assert!((thetao.data[0] - 21.0).abs() < 1e-9);
        assert!(thetao.data[1].is_nan());
        assert!((thetao.data[2] - 20.0).abs() < 1e-9);
        assert!((thetao.data[11] - 22.0).abs() < 1e-9);
    }

    #[test]
    fn test_global_attributes_with_continuation() {
        let ds = parse_cdl(CURRENTS).unwrap();
        assert_eq!(ds.text_attribute("Conventions"), Some("CF-1.6"));
        assert_eq!(ds.text_attribute("history"), Some("created;\nsubset"));
    }

    #[test]
    fn test_coordinates() {
        let ds = parse_cdl(CURRENTS).unwrap();
        assert_eq!(
            ds.coordinate_names(),
            vec!["time", "depth", "latitude", "longitude"]
        );
        assert_eq!(ds.variable("latitude").unwrap().data, vec![40.0, 39.0, 38.0]);
        assert_eq!(ds.variable("longitude").unwrap().data, vec![118.0, 118.5]);
    }

    #[test]
    fn test_header_only() {
        let header = CURRENTS.split("data:").next().unwrap().to_string() + "}\n";
        let ds = parse_cdl(&header).unwrap();
        assert!(ds.variable("uo").unwrap().data.is_empty());
        // The UNLIMITED length still comes from the "(N currently)" note
        assert_eq!(ds.dimension("time").unwrap().len, 2);
    }

    #[test]
    fn test_unlimited_length_inferred_from_data() {
        let text = "netcdf t {\ndimensions:\n\ttime = UNLIMITED ;\n\tx = 2 ;\nvariables:\n\tdouble time(time) ;\n\tdouble v(time, x) ;\ndata:\n time = 0, 1, 2 ;\n v = 1, 2, 3, 4, 5, 6 ;\n}\n";
        let ds = parse_cdl(text).unwrap();
        assert_eq!(ds.dimension("time").unwrap().len, 3);
        assert_eq!(ds.variable("v").unwrap().shape, vec![3, 2]);
    }

    #[test]
    fn test_wrong_value_count() {
        let text = "netcdf t {\ndimensions:\n\tx = 3 ;\nvariables:\n\tdouble v(x) ;\ndata:\n v = 1, 2 ;\n}\n";
        assert!(matches!(parse_cdl(text), Err(NetCdfError::InvalidFormat(_))));
    }

    #[test]
    fn test_unknown_type_reports_line() {
        let text = "netcdf t {\ndimensions:\n\tx = 1 ;\nvariables:\n\tquad v(x) ;\n}\n";
        match parse_cdl(text) {
            Err(NetCdfError::Parse { line, .. }) => assert_eq!(line, 5),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_number_suffixes() {
        assert_eq!(parse_number("1.f"), Some(1.0));
        assert_eq!(parse_number("-3s"), Some(-3.0));
        assert_eq!(parse_number("7UL"), Some(7.0));
        assert_eq!(parse_number("9.96921e+36f"), Some(9.96921e36));
        assert!(parse_number("NaN").unwrap().is_nan());
        assert_eq!(parse_number("-Infinityf"), Some(f64::NEG_INFINITY));
        assert_eq!(parse_number("abc"), None);
    }

    #[test]
    fn test_quoted_terminator_and_multiline_data() {
        let text = "netcdf t {\ndimensions:\n\tx = 2 ;\nvariables:\n\tdouble v(x) ;\n\t\tv:note = \"a; b\" ;\ndata:\n v = 1,\n 2 ;\n}\n";
        let ds = parse_cdl(text).unwrap();
        let v = ds.variable("v").unwrap();
        assert_eq!(v.text_attribute("note"), Some("a; b"));
        assert_eq!(v.data, vec![1.0, 2.0]);
    }

    #[test]
    fn test_long_data_statement_is_linear() {
        let n = 240_000;
        let mut text = format!(
            "netcdf big {{\ndimensions:\n\tx = {} ;\nvariables:\n\tfloat v(x) ;\ndata:\n v = ",
            n
        );
        for i in 0..n {
            text.push_str(&format!("{}.5", i % 1000));
            text.push_str(if i + 1 == n { " ;\n" } else if i % 6 == 5 { ",\n    " } else { ", " });
        }
        text.push_str("}\n");

        let started = std::time::Instant::now();
        let ds = parse_cdl(&text).unwrap();
        let elapsed = started.elapsed();

        let v = ds.variable("v").unwrap();
        assert_eq!(v.data.len(), n);
        assert_eq!(v.data[n - 1], ((n - 1) % 1000) as f64 + 0.5);
        assert!(
            elapsed < std::time::Duration::from_secs(20),
            "parsing {} values took {:?}",
            n,
            elapsed
        );
    }
}
