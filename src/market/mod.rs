//! Market simulation: random draws, asset dynamics and asset paths

mod assets;
mod dynamics;
mod variates;

pub use assets::{
    compounding_factor, discount_bond, discount_value, generate_real_world_path,
    integrated_rate_between, make_path_from_variates, update_path_from_variates, AssetPathTraits,
    AssetState,
};
pub use dynamics::{
    BsVasicekParams, CevCklsParams, Dynamics, Measure, ModelFamily, ModelParams,
};
pub use variates::{make_variates, NormalSource, ScenarioGenerator, Variates};
