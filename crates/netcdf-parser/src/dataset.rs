//! In-memory view of a NetCDF file: named dimensions and named numeric
//! variables with their attributes.
//!
//! Values are stored as `f64` with CF packing already decoded, and missing
//! cells (fill markers, `_FillValue`, `missing_value`) as NaN.

use crate::error::{NetCdfError, NetCdfResult};

/// A named dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    pub name: String,
    pub len: usize,
    pub unlimited: bool,
}

/// Attribute payload.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Text(String),
    Numbers(Vec<f64>),
}

impl AttributeValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            AttributeValue::Numbers(_) => None,
        }
    }

    /// First number of a numeric attribute.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttributeValue::Numbers(values) => values.first().copied(),
            AttributeValue::Text(_) => None,
        }
    }
}

/// A named attribute on a variable or on the dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: AttributeValue,
}

/// A numeric variable, values in row-major order over `dims`.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub dims: Vec<String>,
    pub shape: Vec<usize>,
    pub attributes: Vec<Attribute>,
    pub data: Vec<f64>,
}

impl Variable {
    pub fn new(name: impl Into<String>, dims: Vec<String>, shape: Vec<usize>, data: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            dims,
            shape,
            attributes: Vec::new(),
            data,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.push(Attribute {
            name: name.into(),
            value,
        });
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| &a.value)
    }

    pub fn text_attribute(&self, name: &str) -> Option<&str> {
        self.attribute(name).and_then(AttributeValue::as_text)
    }

    pub fn number_attribute(&self, name: &str) -> Option<f64> {
        self.attribute(name).and_then(AttributeValue::as_number)
    }

    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Position of a named dimension in this variable's dimension list.
    pub fn dim_index(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }

    /// A coordinate variable is one-dimensional and named after its dimension.
    pub fn is_coordinate(&self) -> bool {
        self.dims.len() == 1 && self.dims[0] == self.name
    }

    /// Number of values implied by the shape.
    pub fn expected_len(&self) -> usize {
        self.shape.iter().product()
    }
}

/// Decode CF packing in place.
///
/// Values equal to `_FillValue` or `missing_value` become NaN, then
/// `scale_factor` and `add_offset` are applied to the remaining values.
pub fn unpack(data: &mut [f64], attributes: &[Attribute]) {
    let lookup = |name: &str| {
        attributes
            .iter()
            .find(|a| a.name == name)
            .and_then(|a| a.value.as_number())
    };

    let fill = lookup("_FillValue");
    let missing = lookup("missing_value");
    let scale = lookup("scale_factor").unwrap_or(1.0);
    let offset = lookup("add_offset").unwrap_or(0.0);

    for value in data.iter_mut() {
        if value.is_nan() {
            continue;
        }
        if fill.map_or(false, |f| *value == f) || missing.map_or(false, |m| *value == m) {
            *value = f64::NAN;
            continue;
        }
        *value = *value * scale + offset;
    }
}

/// A whole NetCDF file held in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub dimensions: Vec<Dimension>,
    pub variables: Vec<Variable>,
    pub attributes: Vec<Attribute>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dimension (replacing any existing one with the same name).
    pub fn with_dimension(mut self, name: impl Into<String>, len: usize) -> Self {
        let name = name.into();
        self.dimensions.retain(|d| d.name != name);
        self.dimensions.push(Dimension {
            name,
            len,
            unlimited: false,
        });
        self
    }

    /// Add a dimension and its coordinate variable.
    pub fn with_coordinate(self, name: impl Into<String>, values: Vec<f64>) -> Self {
        let name = name.into();
        let len = values.len();
        let mut ds = self.with_dimension(name.clone(), len);
        ds.variables.retain(|v| v.name != name);
        ds.variables
            .push(Variable::new(name.clone(), vec![name], vec![len], values));
        ds
    }

    /// Add a coordinate variable carrying a `units` attribute (e.g. a CF time axis).
    pub fn with_coordinate_units(
        self,
        name: impl Into<String>,
        values: Vec<f64>,
        units: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let mut ds = self.with_coordinate(name.clone(), values);
        if let Some(var) = ds.variables.iter_mut().find(|v| v.name == name) {
            var.attributes.push(Attribute {
                name: "units".to_string(),
                value: AttributeValue::Text(units.into()),
            });
        }
        ds
    }

    /// Add a data variable over existing dimensions.
    pub fn with_variable(self, name: &str, dims: &[&str], data: Vec<f64>) -> NetCdfResult<Self> {
        let dims: Vec<String> = dims.iter().map(|d| d.to_string()).collect();
        let shape = self.shape_of(&dims)?;
        self.with(Variable::new(name, dims, shape, data))
    }

    /// Add a fully built variable after checking its shape against the dimensions.
    pub fn with(mut self, variable: Variable) -> NetCdfResult<Self> {
        self.insert_variable(variable)?;
        Ok(self)
    }

    pub fn insert_variable(&mut self, variable: Variable) -> NetCdfResult<()> {
        let shape = self.shape_of(&variable.dims)?;
        if shape != variable.shape {
            return Err(NetCdfError::InvalidFormat(format!(
                "variable {} declares shape {:?} but its dimensions give {:?}",
                variable.name, variable.shape, shape
            )));
        }
        if variable.data.len() != variable.expected_len() {
            return Err(NetCdfError::InvalidFormat(format!(
                "variable {} has {} values, expected {}",
                variable.name,
                variable.data.len(),
                variable.expected_len()
            )));
        }
        self.variables.retain(|v| v.name != variable.name);
        self.variables.push(variable);
        Ok(())
    }

    fn shape_of(&self, dims: &[String]) -> NetCdfResult<Vec<usize>> {
        dims.iter()
            .map(|d| {
                self.dimension(d)
                    .map(|dim| dim.len)
                    .ok_or_else(|| NetCdfError::MissingData(format!("dimension {}", d)))
            })
            .collect()
    }

    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    pub fn dimension_names(&self) -> Vec<&str> {
        self.dimensions.iter().map(|d| d.name.as_str()).collect()
    }

    pub fn has_dimension(&self, name: &str) -> bool {
        self.dimension(name).is_some()
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variable(name).is_some()
    }

    /// Names of coordinate variables (1-D variables named after their dimension).
    pub fn coordinate_names(&self) -> Vec<&str> {
        self.variables
            .iter()
            .filter(|v| v.is_coordinate())
            .map(|v| v.name.as_str())
            .collect()
    }

    /// Names of all non-coordinate variables, in file order.
    pub fn data_variable_names(&self) -> Vec<&str> {
        self.variables
            .iter()
            .filter(|v| !v.is_coordinate())
            .map(|v| v.name.as_str())
            .collect()
    }

    pub fn text_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .and_then(|a| a.value.as_text())
    }
}
