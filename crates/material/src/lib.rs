//! Shading resources addressed by named parameters.
//!
//! A [`Material`] is the host-owned side of the uniform feed: a table of
//! named scalar and vector parameters that shader code reads each frame.
//! Producers write through the [`ParameterSink`] trait. The renderer turns
//! the table into a std140 uniform block with a [`UniformLayout`].

mod layout;
mod params;

pub use layout::{LayoutField, UniformLayout, RESOLUTION_PARAMETER, TIME_PARAMETER};
pub use params::{
    Material, MaterialError, MaterialHandle, ParamKind, ParamValue, ParameterSink,
};
