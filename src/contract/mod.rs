//! Profit-sharing contract with guaranteed rate and surplus distribution

mod state;

pub use state::{
    compute_contract_state_path, make_contract_state_path, payoff_path_from_contract_states,
    value_contract, value_contract_from_path, ContractState, ContractTraits,
};
