pub mod shared {
    pub mod constants;
    pub mod image;
    pub mod region;
    pub mod usage;
}

pub mod detection {
    pub mod domain {
        pub mod eye_pair;
        pub mod face_detector;
    }
    pub mod infrastructure;
}

pub mod preprocessing {
    pub mod domain {
        pub mod pipeline_state;
        pub mod preprocessing_step;
        pub mod step_kind;
    }
    pub mod infrastructure;
}

pub mod io {
    pub mod domain {
        pub mod image_reader;
        pub mod image_writer;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod pipeline_logger;
    pub mod preprocess_error;
    pub mod preprocessor;
    pub mod step_registry;
}

pub mod settings;
