pub mod composer;

pub use composer::{
    agreement_bonus, expertise_multiplier, final_score, ScoreComposer, MAX_EXPERTISE_WEIGHT,
    MIN_EXPERTISE_WEIGHT,
};
