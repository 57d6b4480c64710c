pub mod decoders;
pub mod evaluate;
pub mod run;
