pub mod category_dto;

pub use category_dto::{
    CategoryResponseDto, CategoryTreeDto, CreateCategoryDto, FlatRowDto, ListCategoriesQuery,
    OpenTreeViewDto, ReorderCategoryDto, ReorderResponseDto, ToggleNodeDto, TreeViewResponseDto,
    UpdateCategoryDto,
};
