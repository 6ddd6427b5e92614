/// Image used for containerized builds unless configured otherwise.
pub const DOCKER_IMAGE: &str = "rtfd-build";

/// Home directory of the build user inside the container image.
pub const CONTAINER_HOME: &str = "/home/docs";

/// Interpreter environment tool used to create isolated environments.
pub const VIRTUALENV_BIN: &str = "virtualenv";

/// Toolchain installed into every isolated environment.
pub const TOOLCHAIN_PACKAGES: &[&str] = &[
  "sphinx_rtd_theme",
  "sphinx==1.2.2",
  "virtualenv==1.9.1",
  "docutils==0.11",
  "git+git://github.com/ericholscher/readthedocs-sphinx-ext#egg=readthedocs_ext",
];

/// Name of the build configuration entry point inside a checkout.
pub const CONF_FILE: &str = "conf.py";

/// Project install descriptor looked up at the checkout root.
pub const SETUP_FILE: &str = "setup.py";
