//! Pulls one field out of a raw dataset in canonical orientation.
//!
//! The returned array has latitude second to last and longitude last, both
//! ascending, no vertical axis, and no NaN.

use netcdf_parser::Dataset;
use tracing::debug;

use crate::array::GridArray;
use crate::coords::{ResolvedCoords, DEPTH_ALIASES};
use crate::error::{PipelineError, Result};

/// What a field represents, which decides how missing cells are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Currents, temperature, wind: missing cells become 0.
    Physical,
    /// Land-sea mask: missing cells become land (1).
    LandMask,
}

impl FieldKind {
    pub fn fill_value(&self) -> f64 {
        match self {
            FieldKind::Physical => 0.0,
            FieldKind::LandMask => 1.0,
        }
    }
}

/// Extract `name` from `dataset`.
///
/// Returns `Ok(None)` when the variable does not exist. Land masks are
/// additionally reduced to two dimensions.
pub fn extract_variable(
    dataset: &Dataset,
    name: &str,
    coords: &ResolvedCoords,
    kind: FieldKind,
) -> Result<Option<GridArray>> {
    let Some(var) = dataset.variable(name) else {
        return Ok(None);
    };

    let mut array = drop_depth(GridArray::from_variable(var)?)?;

    if kind == FieldKind::LandMask {
        array = reduce_to_2d(array)?;
    }

    let ndim = array.ndim();
    if ndim < 2 {
        return Err(PipelineError::shape(format!(
            "variable {} has {} dimension(s), needs at least latitude and longitude",
            name, ndim
        )));
    }

    check_position(&array, name, &coords.latitude.name, ndim - 2)?;
    check_position(&array, name, &coords.longitude.name, ndim - 1)?;

    if !coords.latitude.ascending {
        array.flip(ndim - 2);
    }
    if !coords.longitude.ascending {
        array.flip(ndim - 1);
    }

    let filled = array.fill_nan(kind.fill_value());
    if filled > 0 {
        debug!(variable = name, cells = filled, fill = kind.fill_value(), "Filled missing cells");
    }

    Ok(Some(array))
}

/// Select the first level of the first vertical axis, if any.
fn drop_depth(array: GridArray) -> Result<GridArray> {
    let depth_axis = DEPTH_ALIASES
        .iter()
        .find_map(|alias| array.dim_index(alias));

    match depth_axis {
        Some(axis) => array.take(axis, 0),
        None => Ok(array),
    }
}

/// A 3-D mask loses its leading (time) axis; anything larger is rejected.
fn reduce_to_2d(array: GridArray) -> Result<GridArray> {
    let array = if array.ndim() == 3 {
        array.take(0, 0)?
    } else {
        array
    };

    if array.ndim() > 2 {
        return Err(PipelineError::shape(format!(
            "land mask has dims {:?} after reduction",
            array.dims
        )));
    }
    Ok(array)
}

fn check_position(array: &GridArray, variable: &str, axis: &str, expected: usize) -> Result<()> {
    match array.dim_index(axis) {
        Some(position) if position != expected => Err(PipelineError::AxisOrder {
            variable: variable.to_string(),
            axis: axis.to_string(),
            position,
            dims: array.dims.clone(),
        }),
        _ => Ok(()),
    }
}
