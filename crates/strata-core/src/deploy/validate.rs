//! Deployment descriptor precondition.

use crate::error::PublishError;
use crate::module::ModuleResource;
use crate::types::ModuleRef;

/// Accepted descriptor file names; `bpel-deploy.xml` is the legacy name.
pub const DESCRIPTOR_NAMES: [&str; 2] = ["deploy.xml", "bpel-deploy.xml"];

/// Require a descriptor file among the module's top-level resources.
pub fn verify_descriptor(
    module: &ModuleRef,
    resources: &[ModuleResource],
) -> Result<(), PublishError> {
    let found = resources
        .iter()
        .any(|r| !r.is_folder() && DESCRIPTOR_NAMES.contains(&r.name.as_str()));
    if found {
        Ok(())
    } else {
        Err(PublishError::missing_descriptor(&module.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> ModuleResource {
        ModuleResource::file(name, format!("/work/{}", name))
    }

    #[test]
    fn accepts_current_and_legacy_names() {
        let module = ModuleRef::new("orders");
        assert!(verify_descriptor(&module, &[file("a.bpel"), file("deploy.xml")]).is_ok());
        assert!(verify_descriptor(&module, &[file("bpel-deploy.xml")]).is_ok());
    }

    #[test]
    fn nested_or_misnamed_descriptors_do_not_count() {
        let module = ModuleRef::new("orders");
        let nested = ModuleResource::folder(
            "META-INF",
            "/work/META-INF",
            vec![ModuleResource::file("META-INF/deploy.xml", "/work/META-INF/deploy.xml")],
        );

        let err = verify_descriptor(&module, &[nested, file("Deploy.xml")])
            .expect_err("descriptor should be missing");
        assert_eq!(err, PublishError::missing_descriptor("orders"));
    }

    #[test]
    fn folder_named_like_descriptor_is_rejected() {
        let module = ModuleRef::new("orders");
        let folder = ModuleResource::folder("deploy.xml", "/work/deploy.xml", Vec::new());
        assert!(verify_descriptor(&module, &[folder]).is_err());
    }
}
