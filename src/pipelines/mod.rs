/**
 * This module contains the shader sources and render pipelines.
 */
pub mod stress;
