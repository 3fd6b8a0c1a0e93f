//! Setters for the three build-step option families: shell, batch, and
//! Python command lists. Each command in the list becomes its own builder
//! step, in declaration order.

use jobsfile_model::descriptor::JobDescriptor;
use xmltree::Document;

use crate::error::GeneratorError;

fn append_steps(doc: &mut Document, builder_tag: &str, command_field: &str, commands: &[String]) -> Result<(), GeneratorError> {
    for command in commands {
        let path = format!("builders/{builder_tag}+/{command_field}");
        doc.set(&path, command.clone())
            .map_err(|e| GeneratorError::from((command_field, e)))?;
    }
    Ok(())
}

pub fn set_build_batch_commands(doc: &mut Document, job: &JobDescriptor) -> Result<(), GeneratorError> {
    if let Some(commands) = &job.build_batch_commands {
        append_steps(doc, "hudson.tasks.BatchFile", "command", commands)?;
    }
    Ok(())
}

pub fn set_build_shell_commands(doc: &mut Document, job: &JobDescriptor) -> Result<(), GeneratorError> {
    if let Some(commands) = &job.build_shell_commands {
        append_steps(doc, "hudson.tasks.Shell", "command", commands)?;
    }
    Ok(())
}

pub fn set_build_python_commands(doc: &mut Document, job: &JobDescriptor) -> Result<(), GeneratorError> {
    if let Some(commands) = &job.build_python_commands {
        append_steps(doc, "hudson.plugins.python.Python", "command", commands)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use jobsfile_model::repository::Repository;

    #[test]
    fn each_command_becomes_its_own_builder_step() {
        let repo = Repository::with_default_branch("https://example.com/org/repo.git");
        let mut job = JobDescriptor::new(repo, IndexMap::new());
        job.build_shell_commands = Some(vec!["make".to_string(), "make test".to_string()]);
        let mut doc = Document::new("project");
        set_build_shell_commands(&mut doc, &job).unwrap();
        let builders = doc.root().children().iter().find(|c| c.tag == "builders").unwrap();
        assert_eq!(builders.children().len(), 2);
        assert_eq!(builders.children()[1].children()[0].text(), Some("make test"));
    }
}
