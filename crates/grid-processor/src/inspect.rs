//! Human-readable description of a raw dataset, as the pipeline sees it.

use std::fmt;

use netcdf_parser::Dataset;

use crate::coords::{resolve_coords, AxisKind, ResolvedAxis, TimeAxis};
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct VariableSummary {
    pub name: String,
    pub dims: Vec<String>,
    pub shape: Vec<usize>,
    pub units: Option<String>,
}

/// Resolved axes and data variables of one dataset.
#[derive(Debug, Clone)]
pub struct DatasetReport {
    pub latitude: ResolvedAxis,
    pub longitude: ResolvedAxis,
    pub time: Option<TimeAxis>,
    pub variables: Vec<VariableSummary>,
}

/// Resolve the axes of `dataset` and list its data variables.
pub fn inspect(dataset: &Dataset) -> Result<DatasetReport> {
    let coords = resolve_coords(dataset, false)?;

    let variables = dataset
        .variables
        .iter()
        .filter(|v| !v.is_coordinate())
        .map(|v| VariableSummary {
            name: v.name.clone(),
            dims: v.dims.clone(),
            shape: v.shape.clone(),
            units: v.text_attribute("units").map(str::to_string),
        })
        .collect();

    Ok(DatasetReport {
        latitude: coords.latitude,
        longitude: coords.longitude,
        time: coords.time,
        variables,
    })
}

fn write_axis(f: &mut fmt::Formatter<'_>, kind: AxisKind, axis: &ResolvedAxis) -> fmt::Result {
    let (first, last) = match (axis.values.first(), axis.values.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return writeln!(f, "  {:<10} {} (empty)", kind.as_str(), axis.name),
    };
    writeln!(
        f,
        "  {:<10} {} [{}] {} .. {} ({})",
        kind.as_str(),
        axis.name,
        axis.len(),
        first,
        last,
        if axis.ascending { "ascending" } else { "descending" }
    )
}

impl fmt::Display for DatasetReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Axes:")?;
        write_axis(f, AxisKind::Latitude, &self.latitude)?;
        write_axis(f, AxisKind::Longitude, &self.longitude)?;
        match &self.time {
            Some(time) => {
                write_axis(f, AxisKind::Time, &time.axis)?;
                if let Some(units) = &time.units {
                    let start = time.axis.values.first().map(|&v| units.to_datetime(v));
                    let end = time.axis.values.last().map(|&v| units.to_datetime(v));
                    if let (Some(start), Some(end)) = (start, end) {
                        writeln!(f, "  {:<10} {} .. {}", "", start.to_rfc3339(), end.to_rfc3339())?;
                    }
                }
            }
            None => writeln!(f, "  {:<10} (none)", "time")?,
        }

        writeln!(f, "Variables:")?;
        for var in &self.variables {
            write!(f, "  {:<10} {:?} {:?}", var.name, var.dims, var.shape)?;
            if let Some(units) = &var.units {
                write!(f, " [{}]", units)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
