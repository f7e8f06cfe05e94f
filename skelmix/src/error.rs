use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("duplicate node name: {name}")]
    DuplicateNode { name: String },

    #[error("unknown parent node '{parent}' for node '{node}'")]
    UnknownParent { node: String, parent: String },

    #[error("node hierarchy contains a cycle through '{node}'")]
    HierarchyCycle { node: String },

    #[error("unknown track: {name}")]
    UnknownTrack { name: String },

    #[error("stale or invalid track handle")]
    InvalidTrackHandle,

    #[error("invalid value for track '{track}': {message}")]
    InvalidTrack { track: String, message: String },

    #[error("invalid value: {message}")]
    InvalidValue { message: String },

    #[cfg(feature = "json")]
    #[error("failed to parse rig JSON: {message}")]
    JsonParse { message: String },

    #[cfg(feature = "json")]
    #[error("unknown frame action '{action}' referenced by track '{track}'")]
    JsonUnknownFrameAction { track: String, action: String },

    #[cfg(feature = "json")]
    #[error("unknown evaluator '{evaluator}' referenced by track '{track}'")]
    JsonUnknownEvaluator { track: String, evaluator: String },

    #[cfg(feature = "json")]
    #[error("track '{track}' must define exactly one of keyframed, procedural or sequential")]
    JsonAmbiguousTrackKind { track: String },
}
