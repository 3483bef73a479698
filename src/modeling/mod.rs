//! # Model integration
//!
//! - `arguments`: the shared filter deciding which optional inputs reach a model
//! - `wrapper`: the `TransformerModel` trait and the wrappers used as training loop models
//! - `callback`: training loop hooks performing the same selection on raw models
//! - `loss`: the `MultiTargetLoss` for models with several outputs
//! - `splitter`: parameter groups for discriminative learning rates
//! - `learner`: a minimal training loop tying the above together

pub mod arguments;
pub mod callback;
pub mod learner;
pub mod loss;
pub mod splitter;
pub mod wrapper;

pub use arguments::{include_argument, ForwardParameters, ModelArguments};
pub use callback::{BatchState, Callback, TransformerInputCallback};
pub use learner::{Learner, Predictions};
pub use loss::{
    Activation, CustomLoss, Decode, LossFunction, LossOptions, LossReduction, LossSlot,
    MultiTargetLoss,
};
pub use splitter::{split_parameters, split_var_store};
pub use wrapper::{ModelWrapper, QuestionAnsweringModelWrapper, TransformerModel};
