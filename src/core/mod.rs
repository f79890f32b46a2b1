mod assets;
mod engine;
mod types;

pub use assets::AssetParameters;
pub use engine::{run_simulation, Simulator};
pub use types::{
    AssetAllocation, AssetClass, SimulationError, SimulationRequest, SimulationResult,
    YearProjection, ASSET_CLASS_COUNT, MAX_HORIZON_YEARS,
};
