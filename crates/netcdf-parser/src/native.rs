//! Native NetCDF reading using the netcdf library.
//!
//! Significantly faster than the ncdump subprocess approach, but needs the
//! libnetcdf and HDF5 development libraries at build time.

use std::path::Path;
use std::sync::Once;

use tracing::debug;

use crate::dataset::{unpack, Attribute, AttributeValue, Dataset, Dimension, Variable};
use crate::error::{NetCdfError, NetCdfResult};

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose error messages to stderr even when errors
/// are handled gracefully by the Rust code (e.g., when probing attributes that
/// don't exist). It only needs to be called once per process, but is safe to
/// call multiple times.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and we're passing null pointers
        // to disable error output, which is a documented valid use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Read every dimension, numeric variable and attribute of a NetCDF file.
pub fn read_native<P: AsRef<Path>>(path: P) -> NetCdfResult<Dataset> {
    silence_hdf5_errors();

    let path = path.as_ref();
    let nc_file = netcdf::open(path)
        .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to open NetCDF: {}", e)))?;

    let dimensions: Vec<Dimension> = nc_file
        .dimensions()
        .map(|d| Dimension {
            name: d.name(),
            len: d.len(),
            unlimited: d.is_unlimited(),
        })
        .collect();

    let mut dataset = Dataset {
        dimensions,
        variables: Vec::new(),
        attributes: collect_attributes(nc_file.attributes()),
    };

    for var in nc_file.variables() {
        let name = var.name();

        // Char and string variables can't be read as f64; they carry no grid data.
        let mut data: Vec<f64> = match var.get_values::<f64, _>(..) {
            Ok(values) => values,
            Err(e) => {
                debug!(variable = %name, error = %e, "Skipping non-numeric variable");
                continue;
            }
        };

        let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
        let attributes = collect_attributes(var.attributes());
        unpack(&mut data, &attributes);

        dataset.insert_variable(Variable {
            name,
            dims,
            shape,
            attributes,
            data,
        })?;
    }

    Ok(dataset)
}

fn collect_attributes<'a>(attrs: impl Iterator<Item = netcdf::Attribute<'a>>) -> Vec<Attribute> {
    attrs
        .filter_map(|attr| {
            let name = attr.name().to_string();
            match attr.value() {
                Ok(value) => Some(Attribute {
                    name,
                    value: convert_attribute(value),
                }),
                Err(e) => {
                    debug!(attribute = %name, error = %e, "Skipping unreadable attribute");
                    None
                }
            }
        })
        .collect()
}

/// Map a netcdf attribute onto the dataset model, keeping every element of
/// array-valued attributes as the CDL reader does.
fn convert_attribute(value: netcdf::AttributeValue) -> AttributeValue {
    use netcdf::AttributeValue as Nc;

    fn numbers<T: Into<f64>>(values: Vec<T>) -> AttributeValue {
        AttributeValue::Numbers(values.into_iter().map(Into::into).collect())
    }

    match value {
        Nc::Str(s) => AttributeValue::Text(s),
        Nc::Strs(parts) => AttributeValue::Text(parts.concat()),
        Nc::Uchar(v) => numbers(vec![v]),
        Nc::Uchars(v) => numbers(v),
        Nc::Schar(v) => numbers(vec![v]),
        Nc::Schars(v) => numbers(v),
        Nc::Ushort(v) => numbers(vec![v]),
        Nc::Ushorts(v) => numbers(v),
        Nc::Short(v) => numbers(vec![v]),
        Nc::Shorts(v) => numbers(v),
        Nc::Uint(v) => numbers(vec![v]),
        Nc::Uints(v) => numbers(v),
        Nc::Int(v) => numbers(vec![v]),
        Nc::Ints(v) => numbers(v),
        Nc::Float(v) => numbers(vec![v]),
        Nc::Floats(v) => numbers(v),
        Nc::Double(v) => numbers(vec![v]),
        Nc::Doubles(v) => numbers(v),
        // 64-bit integers have no lossless f64 conversion.
        Nc::Ulonglong(v) => AttributeValue::Numbers(vec![v as f64]),
        Nc::Ulonglongs(v) => AttributeValue::Numbers(v.into_iter().map(|x| x as f64).collect()),
        Nc::Longlong(v) => AttributeValue::Numbers(vec![v as f64]),
        Nc::Longlongs(v) => AttributeValue::Numbers(v.into_iter().map(|x| x as f64).collect()),
    }
}
