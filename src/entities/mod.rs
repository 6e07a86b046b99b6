//! Clinical record types
//!
//! The toolkit reads four kinds of record:
//!
//! - [`SrccCase`] - outcomes-cohort case with staging, symptoms, treatment
//!   and survival follow-up
//! - [`GastricSurgeryCase`] - one gastrectomy, pre- and post-operative
//! - [`FlotCase`] - one course of perioperative FLOT chemotherapy
//! - [`IntegratedCase`] - a patient with optional surgery and FLOT cases,
//!   input to the precision decision engine
//!
//! Staging shared by all of them lives in [`staging`].

pub mod case;
pub mod flot;
pub mod integrated;
pub mod staging;
pub mod surgery;

pub use case::{
    FrenchSymptom, Gender, HistologyType, SrccCase, SurgicalOutcome, SurvivalMetrics,
    TreatmentProtocol, TreatmentProtocolRecord, VitalStatus,
};
pub use flot::{FlotCase, FlotPhase, ResponseGrade, ToxicityGrade};
pub use integrated::IntegratedCase;
pub use staging::{MetastasisCategory, NodeCategory, StageGroup, TnmStaging, TumorCategory};
pub use surgery::{GastrectomyType, GastricSurgeryCase, ResectionStatus, SurgicalApproach};
