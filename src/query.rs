//! Boundary to the jq collaborator.
//!
//! Expressions are parsed and compiled once through the jaq library, then
//! run against canonical values; results stream back through a callback so
//! evaluation stays lazy. Conversion between the canonical tree and jaq's
//! value type happens only here.

use jaq_core::load::{Arena, File, Loader};
use jaq_core::{Compiler, Ctx, Filter, Native, RcIter};
use jaq_json::Val;

use crate::error::{QqError, Result};
use crate::value::Value;

/// A compiled jq expression, reusable across inputs.
pub struct Query {
    filter: Filter<Native<Val>>,
}

impl std::fmt::Debug for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query").finish()
    }
}

/// Parse and compile a jq expression.
pub fn parse(expression: &str) -> Result<Query> {
    let program = File {
        code: expression,
        path: (),
    };
    let loader = Loader::new(jaq_std::defs().chain(jaq_json::defs()));
    let arena = Arena::default();

    let modules = loader.load(&arena, program).map_err(|errs| {
        QqError::QueryParse(
            errs.into_iter()
                .map(|(_, e)| format!("{e:?}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    })?;

    let filter = Compiler::default()
        .with_funs(jaq_std::funs().chain(jaq_json::funs()))
        .compile(modules)
        .map_err(|errs| {
            QqError::QueryParse(
                errs.into_iter()
                    .map(|(_, e)| format!("{e:?}"))
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        })?;

    Ok(Query { filter })
}

impl Query {
    /// Run the query against `input`, invoking `on_result` for each output
    /// value as it is produced. Stops at the first evaluation error.
    pub fn run(
        &self,
        input: &Value,
        mut on_result: impl FnMut(Value) -> Result<()>,
    ) -> Result<()> {
        let inputs = RcIter::new(core::iter::empty());
        let val = Val::from(to_json(input)?);

        for output in self.filter.run((Ctx::new([], &inputs), val)) {
            let val = output.map_err(|e| QqError::QueryRun(e.to_string()))?;
            on_result(from_json(serde_json::Value::from(val))?)?;
        }
        Ok(())
    }

    /// Run the query and collect every output. Convenience for the
    /// interactive viewer and tests.
    pub fn run_collect(&self, input: &Value) -> Result<Vec<Value>> {
        let mut results = Vec::new();
        self.run(input, |value| {
            results.push(value);
            Ok(())
        })?;
        Ok(results)
    }
}

fn to_json(value: &Value) -> Result<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| QqError::QueryRun(e.to_string()))
}

fn from_json(value: serde_json::Value) -> Result<Value> {
    serde_json::from_value(value).map_err(|e| QqError::QueryRun(e.to_string()))
}
