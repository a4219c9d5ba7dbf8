// Copyright (c)  by Gleb E. Zaslavkiy
//MIT License
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
pub mod Utils;
pub mod error;
pub mod global;
pub mod numerical;
pub mod sketch;
pub mod somelinalg;
pub mod symbolic;
