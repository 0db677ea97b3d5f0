//! Deployment profiles: which interpreter callables a bridge binds.
//!
//! Deployments ship three shapes of the same bridge — a perturber, a batch
//! generator, and a remote dataloader — differing only in the attribute
//! names they resolve at startup. A [`Profile`] is that choice made
//! explicit and configurable.

use serde::{Deserialize, Serialize};

/// One bridge operation and its interpreter-side attribute name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    SetDevice,
    Perturb,
    UpdateAttack,
    UpdateModel,
    PushBatch,
    PopBatch,
    PushModelState,
    UpdateData,
    UpdateDataset,
    UpdateDataloader,
    GetNumBatches,
    GetCleanBatch,
}

impl Op {
    /// The exact attribute name resolved on the embedded module.
    pub const fn symbol(self) -> &'static str {
        match self {
            Op::SetDevice => "set_device",
            Op::Perturb => "perturb",
            Op::UpdateAttack => "update_attack",
            Op::UpdateModel => "update_model",
            Op::PushBatch => "push_batch",
            Op::PopBatch => "pop_batch",
            Op::PushModelState => "push_model_state",
            Op::UpdateData => "update_data",
            Op::UpdateDataset => "update_dataset",
            Op::UpdateDataloader => "update_dataloader",
            Op::GetNumBatches => "get_num_batches",
            Op::GetCleanBatch => "get_clean_batch",
        }
    }
}

/// Naming scheme for the dataloader profile's reconfiguration entry point.
///
/// Deployments either expose a single `update_data` or the split
/// `update_dataset` + `update_dataloader` pair; never both.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataUpdateNaming {
    #[default]
    Unified,
    Split,
}

/// The set of callables a deployment binds at initialisation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// Synchronous perturbation of individual batches.
    Perturber,
    /// Asynchronous generation: clean batches in, adversarial batches out.
    Generator,
    /// Remote dataloading: pipeline reconfiguration plus batch queries.
    Dataloader { naming: DataUpdateNaming },
}

const PERTURBER_OPS: &[Op] = &[Op::SetDevice, Op::Perturb, Op::UpdateAttack, Op::UpdateModel];

const GENERATOR_OPS: &[Op] = &[
    Op::SetDevice,
    Op::UpdateAttack,
    Op::UpdateModel,
    Op::PushBatch,
    Op::PopBatch,
    Op::PushModelState,
];

const DATALOADER_UNIFIED_OPS: &[Op] = &[Op::UpdateData, Op::GetNumBatches, Op::GetCleanBatch];

const DATALOADER_SPLIT_OPS: &[Op] = &[
    Op::UpdateDataset,
    Op::UpdateDataloader,
    Op::GetNumBatches,
    Op::GetCleanBatch,
];

impl Profile {
    /// Operations this profile resolves and binds, in resolution order.
    pub fn ops(self) -> &'static [Op] {
        match self {
            Profile::Perturber => PERTURBER_OPS,
            Profile::Generator => GENERATOR_OPS,
            Profile::Dataloader {
                naming: DataUpdateNaming::Unified,
            } => DATALOADER_UNIFIED_OPS,
            Profile::Dataloader {
                naming: DataUpdateNaming::Split,
            } => DATALOADER_SPLIT_OPS,
        }
    }

    /// Interpreter-side attribute names this profile requires.
    pub fn required_symbols(self) -> impl Iterator<Item = &'static str> {
        self.ops().iter().map(|op| op.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perturber_binds_the_perturb_entry_points() {
        let ops = Profile::Perturber.ops();
        assert!(ops.contains(&Op::Perturb));
        assert!(!ops.contains(&Op::PopBatch));
        assert!(!ops.contains(&Op::GetNumBatches));
    }

    #[test]
    fn generator_binds_the_queue_entry_points() {
        let ops = Profile::Generator.ops();
        assert!(ops.contains(&Op::PushBatch));
        assert!(ops.contains(&Op::PopBatch));
        assert!(ops.contains(&Op::PushModelState));
        assert!(!ops.contains(&Op::Perturb));
    }

    #[test]
    fn data_update_naming_schemes_are_mutually_exclusive() {
        let unified = Profile::Dataloader {
            naming: DataUpdateNaming::Unified,
        }
        .ops();
        let split = Profile::Dataloader {
            naming: DataUpdateNaming::Split,
        }
        .ops();

        assert!(unified.contains(&Op::UpdateData));
        assert!(!unified.contains(&Op::UpdateDataset));
        assert!(!unified.contains(&Op::UpdateDataloader));

        assert!(split.contains(&Op::UpdateDataset));
        assert!(split.contains(&Op::UpdateDataloader));
        assert!(!split.contains(&Op::UpdateData));
    }

    #[test]
    fn profiles_parse_from_config_json() {
        let perturber: Profile = serde_json::from_str("\"perturber\"").unwrap();
        assert_eq!(perturber, Profile::Perturber);

        let dataloader: Profile =
            serde_json::from_str(r#"{"dataloader":{"naming":"split"}}"#).unwrap();
        assert_eq!(
            dataloader,
            Profile::Dataloader {
                naming: DataUpdateNaming::Split
            }
        );
    }

    #[test]
    fn symbols_match_the_embedded_module_contract() {
        let symbols: Vec<_> = Profile::Generator.required_symbols().collect();
        assert_eq!(
            symbols,
            [
                "set_device",
                "update_attack",
                "update_model",
                "push_batch",
                "pop_batch",
                "push_model_state"
            ]
        );
    }
}
