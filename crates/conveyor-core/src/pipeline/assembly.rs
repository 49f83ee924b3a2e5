use crate::models::{CoreError, CoreErrorKind, CoreResult};
use crate::namespace::{Binding, NamespaceSet};
use crate::pipeline::Pipeline;

/// Resolves each reference in order and flattens groups into one pipeline.
pub fn assemble<S: AsRef<str>>(
    references: &[S],
    namespaces: &NamespaceSet,
) -> CoreResult<Pipeline> {
    let mut pipeline = Pipeline::new();

    for reference in references {
        let reference = reference.as_ref();
        match namespaces.resolve(reference)? {
            Binding::Task(id) => pipeline.push(*id),
            Binding::Group(ids) => pipeline.extend(ids.iter().copied()),
            other => {
                return Err(CoreError::new(
                    CoreErrorKind::NotATask,
                    format!(
                        "'{reference}' resolves to a {}, not a task or a group of tasks",
                        other.describe()
                    ),
                ));
            }
        }
    }

    tracing::debug!(
        references = references.len(),
        tasks = pipeline.len(),
        "assembled pipeline"
    );

    Ok(pipeline)
}
